#![no_main]

use libfuzzer_sys::fuzz_target;
use z3armor::{Error, RandomSource, Z3Armor};

// First 8 bytes seed the generator, the next 2 or 3 bytes form the secret.
fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let (seed, rest) = data.split_at(8);
    let seed = u64::from_le_bytes(seed.try_into().unwrap());
    let secret = rest[..rest.len().min(3)].to_vec();

    let mut armor = Z3Armor::new(secret.clone(), RandomSource::Seeded(seed));
    match armor.fit() {
        Ok(()) => {}
        // Some byte pairs cannot be pinned by the operator catalog alone.
        Err(Error::Incomplete { .. }) => return,
        Err(err) => panic!("{err}"),
    }

    assert!(armor.complete().unwrap());
    assert!(armor.verify(&secret));
    for constraint in armor.constraints() {
        assert!(constraint.check(&secret), "{constraint}");
    }
});
