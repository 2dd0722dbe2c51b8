use rand::Rng;
use slap_core::ROOM_CODE_ALPHABET;
use slap_core::ROOM_CODE_LENGTH;

/// Samples a room code from the unambiguous alphabet (A-Z, 2-9 minus
/// lookalikes). Collision handling is the caller's job; the parlor retries
/// a bounded number of times against the store.
pub fn generate_room_code<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_reduced_alphabet() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains(['I', 'O', '1', '0']));
        }
    }
}
