use crate::utils::{deploy_contract, setup_sandbox};
use near_workspaces::types::{Gas as NearGas, NearToken};
use serde_json::json;

const MINT_PRICE: NearToken = NearToken::from_millinear(50); // 0.05 NEAR
const SALE_PRICE: u128 = 1_000_000_000_000_000_000_000_000; // 1 NEAR
const FEE_BPS: u16 = 250; // 2.5%

/// Full cross-contract path: mint a patent NFT, approve and list it, buy it.
/// Asserts the buyer ends up owning the token and the sale price splits
/// 97.5% / 2.5% between seller and fee recipient.
#[tokio::test]
async fn test_mint_list_buy_flow() -> anyhow::Result<()> {
    let worker = setup_sandbox().await?;
    let registry = deploy_contract(&worker, "patent_registry").await?;
    let marketplace = deploy_contract(&worker, "patent_marketplace").await?;

    let owner = worker.dev_create_account().await?;
    let seller = worker.dev_create_account().await?;
    let buyer = worker.dev_create_account().await?;
    let fee_recipient = worker.dev_create_account().await?;

    registry
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "mint_price": MINT_PRICE.as_yoctonear().to_string(),
            "base_uri": null,
        }))
        .transact()
        .await?
        .into_result()?;
    marketplace
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "fee_bps": FEE_BPS,
            "fee_recipient": fee_recipient.id(),
        }))
        .transact()
        .await?
        .into_result()?;

    // Mint.
    let token_id: String = seller
        .call(registry.id(), "mint_patent_nft")
        .args_json(json!({
            "receiver_id": seller.id(),
            "patent_number": "US-1234567-B1",
            "ipfs_hash": "QmPatentMetadata",
        }))
        .deposit(MINT_PRICE)
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?
        .json()?;
    assert_eq!(token_id, "1");

    // Approve the marketplace and pick up the approval id from the token.
    seller
        .call(registry.id(), "nft_approve")
        .args_json(json!({
            "token_id": token_id,
            "account_id": marketplace.id(),
            "msg": null,
        }))
        .deposit(NearToken::from_millinear(10))
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?
        .into_result()?;
    let token: serde_json::Value = registry
        .call("nft_token")
        .args_json(json!({ "token_id": token_id }))
        .view()
        .await?
        .json()?;
    let approval_id = token["approved_account_ids"][marketplace.id().as_str()]
        .as_u64()
        .expect("marketplace approval missing");

    // List; the marketplace verifies ownership and approval via view calls
    // before storing the listing.
    seller
        .call(marketplace.id(), "list_patent")
        .args_json(json!({
            "nft_contract_id": registry.id(),
            "token_id": token_id,
            "approval_id": approval_id,
            "price": SALE_PRICE.to_string(),
        }))
        .deposit(NearToken::from_yoctonear(1))
        .gas(NearGas::from_tgas(300))
        .transact()
        .await?
        .into_result()?;
    let listing: serde_json::Value = marketplace
        .call("get_active_listing")
        .args_json(json!({
            "nft_contract_id": registry.id(),
            "token_id": token_id,
        }))
        .view()
        .await?
        .json()?;
    let listing_id = listing["listing_id"].as_u64().expect("listing not stored");
    assert_eq!(listing["seller_id"].as_str(), Some(seller.id().as_str()));

    // Buy.
    buyer
        .call(marketplace.id(), "buy_patent")
        .args_json(json!({ "listing_id": listing_id }))
        .deposit(NearToken::from_yoctonear(SALE_PRICE))
        .gas(NearGas::from_tgas(300))
        .transact()
        .await?
        .into_result()?;

    // Ownership moved to the buyer.
    let token: serde_json::Value = registry
        .call("nft_token")
        .args_json(json!({ "token_id": token_id }))
        .view()
        .await?
        .json()?;
    assert_eq!(token["owner_id"].as_str(), Some(buyer.id().as_str()));

    // Listing is out of circulation.
    let listing: serde_json::Value = marketplace
        .call("get_listing")
        .args_json(json!({ "listing_id": listing_id }))
        .view()
        .await?
        .json()?;
    assert_eq!(listing["active"].as_bool(), Some(false));

    // 2.5% fee split, credited as pull payments.
    let fee = SALE_PRICE * FEE_BPS as u128 / 10_000;
    let seller_credit: String = marketplace
        .call("get_pending_withdrawal")
        .args_json(json!({ "account_id": seller.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(seller_credit, (SALE_PRICE - fee).to_string());
    let fee_credit: String = marketplace
        .call("get_pending_withdrawal")
        .args_json(json!({ "account_id": fee_recipient.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(fee_credit, fee.to_string());

    // Seller pulls the proceeds out.
    let balance_before = seller.view_account().await?.balance;
    seller
        .call(marketplace.id(), "withdraw_funds")
        .gas(NearGas::from_tgas(100))
        .transact()
        .await?
        .into_result()?;
    let seller_credit: String = marketplace
        .call("get_pending_withdrawal")
        .args_json(json!({ "account_id": seller.id() }))
        .view()
        .await?
        .json()?;
    assert_eq!(seller_credit, "0");
    let balance_after = seller.view_account().await?.balance;
    assert!(balance_after > balance_before);

    Ok(())
}
