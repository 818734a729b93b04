use rand::Rng;
use uuid::Uuid;

use crate::ObjectId;

/// Generate a deterministic v4-format object id from a seeded RNG.
pub fn generate_object_id(rng: &mut impl Rng) -> ObjectId {
    let bytes: [u8; 16] = rng.gen();
    ObjectId(uuid::Builder::from_random_bytes(bytes).into_uuid())
}

/// Fixed id for fixtures and hand-built worlds.
impl From<u128> for ObjectId {
    fn from(value: u128) -> Self {
        ObjectId(Uuid::from_u128(value))
    }
}
