//! Random password generation for new credentials.

use rand::Rng;

pub const DEFAULT_PASSWORD_LEN: usize = 16;

const LETTERS_DIGITS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generate a password of `length` characters drawn uniformly from letters,
/// digits and (optionally) punctuation.
pub fn generate_password(length: usize, symbols: bool) -> String {
    let pool: Vec<u8> = if symbols {
        [LETTERS_DIGITS, PUNCTUATION].concat()
    } else {
        LETTERS_DIGITS.to_vec()
    };

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| pool[rng.gen_range(0..pool.len())] as char)
        .collect()
}
