//! Stable actor identifiers derived from battle ids.

use sha2::{Digest, Sha256};

const ACTOR_PREFIX: &str = "battle-";

/// Number of hex characters of the digest kept in the actor id.
const DIGEST_CHARS: usize = 16;

/// Actor id for `battle_id`: `battle-` followed by the first 16 hex
/// characters of its SHA-256 digest.
pub fn actor_id_for(battle_id: &str) -> String {
    let digest = Sha256::digest(battle_id.as_bytes());
    let mut id = String::with_capacity(ACTOR_PREFIX.len() + DIGEST_CHARS);
    id.push_str(ACTOR_PREFIX);
    id.push_str(&hex::encode(&digest[..DIGEST_CHARS / 2]));
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_ids_are_stable_and_prefixed() {
        let first = actor_id_for("arena-42");
        assert_eq!(first, actor_id_for("arena-42"));
        assert!(first.starts_with("battle-"));
        assert_eq!(first.len(), "battle-".len() + 16);
        assert!(first["battle-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn known_digest_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(actor_id_for("abc"), "battle-ba7816bf8f01cfea");
    }

    #[test]
    fn distinct_battles_get_distinct_actors() {
        assert_ne!(actor_id_for("a"), actor_id_for("b"));
    }
}
