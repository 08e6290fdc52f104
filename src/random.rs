use rand::{Rng, distributions::Alphanumeric, thread_rng};

/// Length of a share-link hash.
pub const SHARE_HASH_LEN: usize = 10;

/// Random string over `[A-Za-z0-9]`.
pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}
