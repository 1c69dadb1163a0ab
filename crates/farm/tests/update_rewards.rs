mod common;

use farm_core::{
    errors::{FarmError, FarmRevert},
    verifier::{MockVerifier, SignatureVerifier},
};

use crate::common::*;

#[test]
fn test_update_rewards_per_block() {
    let mut test = setup();
    let admin = test.admin.clone();
    let verifier = SignatureVerifier::new(admin.address());

    let certificate = permission(&admin, 10_000);
    test.farm
        .update_rewards_per_block(&ctx(5, admin.address()), &verifier, &certificate, 100)
        .unwrap();
    assert_eq!(test.farm.reward_per_block(), 100);
}

#[test]
fn test_update_rewards_expired_permission() {
    let mut test = setup();
    let admin = test.admin.clone();
    let verifier = SignatureVerifier::new(admin.address());

    // The permission is valid strictly below its bound.
    let certificate = permission(&admin, 5);
    let result =
        test.farm.update_rewards_per_block(&ctx(5, admin.address()), &verifier, &certificate, 100);
    assert_eq!(
        result,
        Err(FarmError::Revert(FarmRevert::AuthorizationExpired { height: 5, until: 5 }))
    );
    assert_eq!(test.farm.reward_per_block(), 5);

    test.farm
        .update_rewards_per_block(&ctx(4, admin.address()), &verifier, &certificate, 100)
        .unwrap();
    assert_eq!(test.farm.reward_per_block(), 100);
}

#[test]
fn test_update_rewards_invalid_certificate() {
    let mut test = setup();
    let admin = test.admin.clone();
    let mallory = signer("mallory");
    let verifier = SignatureVerifier::new(admin.address());

    let forged = permission(&mallory, 10_000);
    let result =
        test.farm.update_rewards_per_block(&ctx(0, mallory.address()), &verifier, &forged, 1_000);
    assert_eq!(result, Err(FarmError::Revert(FarmRevert::InvalidProof)));

    let mut tampered = permission(&admin, 1);
    tampered.input.permissionUntilBlockHeight = 10_000;
    let result =
        test.farm.update_rewards_per_block(&ctx(2, admin.address()), &verifier, &tampered, 1_000);
    assert_eq!(result, Err(FarmError::Revert(FarmRevert::InvalidProof)));
    assert_eq!(test.farm.reward_per_block(), 5);
}

#[test]
fn test_update_rewards_mock_verifier_still_checks_expiry() {
    let mut test = setup();
    let bob = test.bob.clone();

    let certificate = permission(&bob, 3);
    let result =
        test.farm.update_rewards_per_block(&ctx(8, bob.address()), &MockVerifier, &certificate, 9);
    assert_eq!(
        result,
        Err(FarmError::Revert(FarmRevert::AuthorizationExpired { height: 8, until: 3 }))
    );
}

#[test]
fn test_new_rate_applies_to_later_rollups() {
    let mut test = setup();
    let admin = test.admin.clone();
    let alice = test.alice.clone();
    let verifier = SignatureVerifier::new(admin.address());

    test.deposit(0, &alice, 30);
    test.rollup(1).unwrap();
    assert_farm_data(&test, 253, 32);

    let certificate = permission(&admin, 10_000);
    test.farm
        .update_rewards_per_block(&ctx(1, admin.address()), &verifier, &certificate, 100)
        .unwrap();

    // One block at 100 per block over a pool of 32: +312 per share.
    test.claim(1, &alice);
    test.rollup(2).unwrap();
    assert_farm_data(&test, 565, 32);
    assert_eq!(test.rewards_of(alice.address()), vec![0, 93]);
}
