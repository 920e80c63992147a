use super::internal::compute_fee;
use super::*;
use near_sdk::test_utils::{accounts, VMContextBuilder};
use near_sdk::testing_env;

const PRICE: u128 = 1_000_000_000_000_000_000_000_000; // 1 NEAR
const FEE_BPS: u16 = 250; // 2.5%

fn owner() -> AccountId {
    accounts(0)
}

fn seller() -> AccountId {
    accounts(1)
}

fn buyer() -> AccountId {
    accounts(2)
}

fn nft_contract() -> AccountId {
    accounts(4)
}

fn fee_recipient() -> AccountId {
    accounts(5)
}

fn setup() -> (VMContextBuilder, Contract) {
    let mut context = VMContextBuilder::new();
    context
        .current_account_id(accounts(3))
        .predecessor_account_id(owner());
    testing_env!(context.build());
    let contract = Contract::new(owner(), FEE_BPS, Some(fee_recipient()));
    (context, contract)
}

fn set_caller(context: &mut VMContextBuilder, caller: AccountId, deposit: u128) {
    testing_env!(context
        .predecessor_account_id(caller)
        .attached_deposit(NearToken::from_yoctonear(deposit))
        .build());
}

fn add_listing(contract: &mut Contract) -> u64 {
    contract.internal_add_listing(
        nft_contract(),
        "1".to_string(),
        7,
        U128(PRICE),
        seller(),
    )
}

#[test]
#[should_panic(expected = "Fee exceeds the maximum")]
fn new_rejects_excessive_fee() {
    Contract::new(owner(), MAX_FEE_BPS + 1, None);
}

#[test]
fn listing_ids_are_sequential_from_one() {
    let (_context, mut contract) = setup();
    let first = add_listing(&mut contract);
    assert_eq!(first, 1);

    let second = contract.internal_add_listing(
        nft_contract(),
        "2".to_string(),
        8,
        U128(PRICE),
        seller(),
    );
    assert_eq!(second, 2);
    assert!(contract.get_listing(0).is_none());
}

#[test]
fn listing_indexed_by_token_pair() {
    let (_context, mut contract) = setup();
    let id = add_listing(&mut contract);

    let listing = contract
        .get_active_listing(nft_contract(), "1".to_string())
        .unwrap();
    assert_eq!(listing.listing_id, id);
    assert_eq!(listing.seller_id, seller());
    assert_eq!(listing.price.0, PRICE);
    assert!(listing.active);
}

#[test]
fn list_patent_rejects_zero_price() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, seller(), 1);
    let err = contract
        .list_patent(nft_contract(), "1".to_string(), 7, U128(0))
        .err()
        .unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
}

#[test]
fn list_patent_rejects_empty_token_id() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, seller(), 1);
    let err = contract
        .list_patent(nft_contract(), String::new(), 7, U128(PRICE))
        .err()
        .unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
}

#[test]
fn list_patent_requires_deposit() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, seller(), 0);
    let err = contract
        .list_patent(nft_contract(), "1".to_string(), 7, U128(PRICE))
        .err()
        .unwrap();
    assert!(matches!(err, MarketplaceError::InsufficientDeposit(_)));
}

#[test]
fn list_patent_rejects_duplicate_active_listing() {
    let (mut context, mut contract) = setup();
    add_listing(&mut contract);

    set_caller(&mut context, seller(), 1);
    let err = contract
        .list_patent(nft_contract(), "1".to_string(), 9, U128(PRICE))
        .err()
        .unwrap();
    assert!(matches!(err, MarketplaceError::InvalidState(_)));
}

#[test]
fn relisting_allowed_after_cancel_with_fresh_id() {
    let (mut context, mut contract) = setup();
    let first = add_listing(&mut contract);

    set_caller(&mut context, seller(), 1);
    contract.cancel_listing(first).unwrap();

    let second = add_listing(&mut contract);
    assert_eq!(second, first + 1);
    assert!(!contract.get_listing(first).unwrap().active);
    assert_eq!(
        contract
            .get_active_listing(nft_contract(), "1".to_string())
            .unwrap()
            .listing_id,
        second
    );
}

#[test]
fn buy_patent_deactivates_listing_before_transfer() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), PRICE);
    contract.buy_patent(id).unwrap();

    // Listing is out of circulation as soon as the transfer is issued.
    let listing = contract.get_listing(id).unwrap();
    assert!(!listing.active);
    assert!(contract
        .get_active_listing(nft_contract(), "1".to_string())
        .is_none());
}

#[test]
fn buy_patent_rejects_unknown_listing() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, buyer(), PRICE);
    let err = contract.buy_patent(42).err().unwrap();
    assert!(matches!(err, MarketplaceError::NotFound(_)));
}

#[test]
fn buy_patent_rejects_inactive_listing() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);
    contract.internal_deactivate_listing(id);

    set_caller(&mut context, buyer(), PRICE);
    let err = contract.buy_patent(id).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidState(_)));
}

#[test]
fn buy_patent_rejects_self_purchase() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, seller(), PRICE);
    let err = contract.buy_patent(id).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
}

#[test]
fn buy_patent_rejects_insufficient_deposit() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), PRICE - 1);
    let err = contract.buy_patent(id).err().unwrap();
    assert!(matches!(err, MarketplaceError::InsufficientDeposit(_)));
    assert!(contract.get_listing(id).unwrap().active);
}

#[test]
fn buy_patent_requires_fee_recipient() {
    let mut context = VMContextBuilder::new();
    context
        .current_account_id(accounts(3))
        .predecessor_account_id(owner());
    testing_env!(context.build());
    let mut contract = Contract::new(owner(), FEE_BPS, None);
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), PRICE);
    let err = contract.buy_patent(id).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidState(_)));
}

#[test]
fn in_flight_deposit_reserved_against_sweep() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), PRICE);
    contract.buy_patent(id).unwrap();

    // The deposit is not yet anyone's credit, but it already counts toward
    // the escrow total the owner cannot touch.
    assert_eq!(contract.get_total_pending().0, PRICE);
    testing_env!(context
        .predecessor_account_id(owner())
        .account_balance(NearToken::from_yoctonear(PRICE))
        .build());
    let err = contract.emergency_withdraw(U128(1)).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
}

#[test]
fn finalize_success_converts_reservation_into_credits() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    let overpaid = PRICE + 777;
    set_caller(&mut context, buyer(), overpaid);
    contract.buy_patent(id).unwrap();
    assert_eq!(contract.get_total_pending().0, overpaid);

    contract.internal_finalize_purchase(
        true,
        id,
        nft_contract(),
        "1".to_string(),
        seller(),
        buyer(),
        PRICE,
        overpaid,
        FEE_BPS,
        fee_recipient(),
    );

    // Reservation released, same total now held as individual credits.
    assert_eq!(contract.get_total_pending().0, overpaid);
    let fee = PRICE * FEE_BPS as u128 / BASIS_POINTS as u128;
    assert_eq!(contract.get_pending_withdrawal(seller()).0, PRICE - fee);
    assert_eq!(contract.get_pending_withdrawal(fee_recipient()).0, fee);
    assert_eq!(contract.get_pending_withdrawal(buyer()).0, 777);
}

#[test]
fn finalize_failure_converts_reservation_into_buyer_credit() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), PRICE);
    contract.buy_patent(id).unwrap();

    contract.internal_finalize_purchase(
        false,
        id,
        nft_contract(),
        "1".to_string(),
        seller(),
        buyer(),
        PRICE,
        PRICE,
        FEE_BPS,
        fee_recipient(),
    );

    assert_eq!(contract.get_total_pending().0, PRICE);
    assert_eq!(contract.get_pending_withdrawal(buyer()).0, PRICE);
    assert_eq!(contract.get_pending_withdrawal(seller()).0, 0);
    assert!(!contract.get_listing(id).unwrap().active);
}

#[test]
fn settlement_conserves_the_full_deposit() {
    let (_context, mut contract) = setup();
    let id = add_listing(&mut contract);
    contract.internal_deactivate_listing(id);

    let overpaid = PRICE + 12_345;
    contract.internal_settle_purchase(
        id,
        nft_contract(),
        "1".to_string(),
        seller(),
        buyer(),
        PRICE,
        overpaid,
        FEE_BPS,
        fee_recipient(),
    );

    let fee = PRICE * FEE_BPS as u128 / BASIS_POINTS as u128;
    assert_eq!(contract.get_pending_withdrawal(seller()).0, PRICE - fee);
    assert_eq!(contract.get_pending_withdrawal(fee_recipient()).0, fee);
    assert_eq!(contract.get_pending_withdrawal(buyer()).0, 12_345);
    assert_eq!(contract.get_total_pending().0, overpaid);
}

#[test]
fn settlement_with_zero_fee_credits_seller_everything() {
    let (_context, mut contract) = setup();
    let id = add_listing(&mut contract);
    contract.internal_deactivate_listing(id);

    contract.internal_settle_purchase(
        id,
        nft_contract(),
        "1".to_string(),
        seller(),
        buyer(),
        PRICE,
        PRICE,
        0,
        fee_recipient(),
    );

    assert_eq!(contract.get_pending_withdrawal(seller()).0, PRICE);
    assert_eq!(contract.get_pending_withdrawal(fee_recipient()).0, 0);
    assert_eq!(contract.get_pending_withdrawal(buyer()).0, 0);
}

#[test]
fn failed_transfer_credits_buyer_and_leaves_listing_inactive() {
    let (_context, mut contract) = setup();
    let id = add_listing(&mut contract);
    contract.internal_deactivate_listing(id);

    contract.internal_refund_purchase(id, buyer(), PRICE);

    assert_eq!(contract.get_pending_withdrawal(buyer()).0, PRICE);
    assert_eq!(contract.get_total_pending().0, PRICE);
    assert!(!contract.get_listing(id).unwrap().active);
    assert_eq!(contract.get_pending_withdrawal(seller()).0, 0);
}

#[test]
fn withdraw_funds_zeroes_balance_exactly_once() {
    let (mut context, mut contract) = setup();
    contract.internal_credit(&seller(), PRICE);
    assert_eq!(contract.get_total_pending().0, PRICE);

    set_caller(&mut context, seller(), 0);
    contract.withdraw_funds().unwrap();
    assert_eq!(contract.get_pending_withdrawal(seller()).0, 0);
    assert_eq!(contract.get_total_pending().0, 0);

    let err = contract.withdraw_funds().err().unwrap();
    assert!(matches!(err, MarketplaceError::NotFound(_)));
}

#[test]
fn withdraw_funds_rejects_account_with_no_credit() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, buyer(), 0);
    let err = contract.withdraw_funds().err().unwrap();
    assert!(matches!(err, MarketplaceError::NotFound(_)));
}

#[test]
fn cancel_listing_by_seller() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, seller(), 1);
    contract.cancel_listing(id).unwrap();
    assert!(!contract.get_listing(id).unwrap().active);
    assert!(contract
        .get_active_listing(nft_contract(), "1".to_string())
        .is_none());
}

#[test]
fn cancel_listing_by_contract_owner() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, owner(), 1);
    contract.cancel_listing(id).unwrap();
    assert!(!contract.get_listing(id).unwrap().active);
}

#[test]
fn cancel_listing_rejects_third_party() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, buyer(), 1);
    let err = contract.cancel_listing(id).unwrap_err();
    assert!(matches!(err, MarketplaceError::Unauthorized(_)));
}

#[test]
fn cancel_listing_rejects_inactive() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);
    contract.internal_deactivate_listing(id);

    set_caller(&mut context, seller(), 1);
    let err = contract.cancel_listing(id).unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidState(_)));
}

#[test]
fn cancel_listing_requires_exactly_one_yocto() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, seller(), 2);
    let err = contract.cancel_listing(id).unwrap_err();
    assert!(matches!(err, MarketplaceError::InsufficientDeposit(_)));
}

#[test]
fn update_listing_price_by_seller() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, seller(), 1);
    contract.update_listing_price(id, U128(PRICE * 2)).unwrap();
    assert_eq!(contract.get_listing(id).unwrap().price.0, PRICE * 2);
}

#[test]
fn update_listing_price_rejects_non_seller() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, owner(), 1);
    let err = contract.update_listing_price(id, U128(PRICE * 2)).unwrap_err();
    assert!(matches!(err, MarketplaceError::Unauthorized(_)));
}

#[test]
fn update_listing_price_rejects_zero_and_inactive() {
    let (mut context, mut contract) = setup();
    let id = add_listing(&mut contract);

    set_caller(&mut context, seller(), 1);
    let err = contract.update_listing_price(id, U128(0)).unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));

    contract.internal_deactivate_listing(id);
    let err = contract.update_listing_price(id, U128(PRICE)).unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidState(_)));
}

#[test]
fn set_platform_fee_capped() {
    let (_context, mut contract) = setup();
    contract.set_platform_fee(MAX_FEE_BPS).unwrap();
    assert_eq!(contract.get_fee_config().fee_bps, MAX_FEE_BPS);

    let err = contract.set_platform_fee(MAX_FEE_BPS + 1).unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
}

#[test]
fn set_platform_fee_requires_owner() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, seller(), 0);
    let err = contract.set_platform_fee(100).unwrap_err();
    assert!(matches!(err, MarketplaceError::Unauthorized(_)));
}

#[test]
fn set_fee_recipient_updates_config() {
    let (_context, mut contract) = setup();
    contract.set_fee_recipient(accounts(4)).unwrap();
    assert_eq!(contract.get_fee_config().fee_recipient, Some(accounts(4)));
}

#[test]
fn emergency_withdraw_cannot_touch_escrow() {
    let (mut context, mut contract) = setup();
    contract.internal_credit(&seller(), PRICE);

    // Contract holds exactly the escrowed amount: nothing to sweep.
    testing_env!(context
        .predecessor_account_id(owner())
        .account_balance(NearToken::from_yoctonear(PRICE))
        .build());
    let err = contract.emergency_withdraw(U128(1)).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));

    // With surplus above the escrow, only the surplus is sweepable.
    testing_env!(context
        .predecessor_account_id(owner())
        .account_balance(NearToken::from_yoctonear(PRICE + 500))
        .build());
    let err = contract.emergency_withdraw(U128(501)).err().unwrap();
    assert!(matches!(err, MarketplaceError::InvalidInput(_)));
    contract.emergency_withdraw(U128(500)).unwrap();
}

#[test]
fn emergency_withdraw_requires_owner() {
    let (mut context, mut contract) = setup();
    set_caller(&mut context, seller(), 0);
    let err = contract.emergency_withdraw(U128(1)).err().unwrap();
    assert!(matches!(err, MarketplaceError::Unauthorized(_)));
}

#[test]
fn get_all_active_listings_filters_and_paginates() {
    let (mut context, mut contract) = setup();
    for i in 0..5 {
        contract.internal_add_listing(
            nft_contract(),
            format!("{}", i),
            i,
            U128(PRICE),
            seller(),
        );
    }
    set_caller(&mut context, seller(), 1);
    contract.cancel_listing(2).unwrap();

    let all = contract.get_all_active_listings(None, None);
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|l| l.active && l.listing_id != 2));

    let page = contract.get_all_active_listings(Some(1), Some(2));
    assert_eq!(page.len(), 2);
}

#[test]
fn fee_math_has_no_overflow() {
    // Worst case: max u128 price at the max fee.
    let fee = compute_fee(u128::MAX, MAX_FEE_BPS);
    assert_eq!(fee, u128::MAX / BASIS_POINTS as u128 * MAX_FEE_BPS as u128
        + (u128::MAX % BASIS_POINTS as u128) * MAX_FEE_BPS as u128 / BASIS_POINTS as u128);
    assert_eq!(compute_fee(PRICE, 250), PRICE / 40);
}
