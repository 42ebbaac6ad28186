use crate::common::util::get_current_time_or_zero;
use rand::rngs::OsRng;
use rand::Rng;

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generates an id for a document created without one.
///
/// The id is the current time in milliseconds followed by nine random
/// base-36 characters. Ids generated in the same millisecond differ in the
/// suffix, so they are unique with overwhelming probability and roughly
/// sortable by creation time.
pub fn generate_document_id() -> String {
    let mut id = get_current_time_or_zero().to_string();
    id.reserve(RANDOM_SUFFIX_LEN);
    for _ in 0..RANDOM_SUFFIX_LEN {
        let index = OsRng.gen_range(0..BASE36_ALPHABET.len());
        id.push(BASE36_ALPHABET[index] as char);
    }
    id
}
