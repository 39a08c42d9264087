//! Utility functions for getting hashes
use std::hash::{DefaultHasher, Hash, Hasher};

pub(crate) fn calculate_hash<T: Hash + ?Sized>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

pub(crate) fn hash_as_hex_string<T: Hash + ?Sized>(t: &T) -> String {
    format!("{:x}", calculate_hash(t))
}

/// Hash a sequence of ids in order, so the same ids always produce the same hex string
pub(crate) fn hash_ids_as_hex_string<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut s = DefaultHasher::new();
    for id in ids {
        id.hash(&mut s);
    }
    format!("{:x}", s.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hashes() {
        assert_eq!(hash_as_hex_string("PFK"), hash_as_hex_string("PFK"));
        assert_ne!(hash_as_hex_string("PFK"), hash_as_hex_string("PGI"));
        assert_eq!(
            hash_ids_as_hex_string(["PFK", "PGI"]),
            hash_ids_as_hex_string(vec!["PFK", "PGI"])
        );
        assert_ne!(
            hash_ids_as_hex_string(["PFK", "PGI"]),
            hash_ids_as_hex_string(["PGI", "PFK"])
        );
    }
}
