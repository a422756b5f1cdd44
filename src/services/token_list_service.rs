use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::entity::{
    Address, Result, Token, TokenID, TokenListItem, TokenListItemStatus, WalletError,
};
use crate::repository::TokenListItemRepository;

/// Source of the remote token list.
#[async_trait]
pub trait TokenListDomainService: Send + Sync {
    async fn items(&self) -> Result<Vec<TokenListItem>>;
}

#[derive(Debug, Deserialize)]
struct TokenListResponse {
    results: Vec<RelayToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayToken {
    address: String,
    name: String,
    symbol: String,
    decimals: u32,
    logo_uri: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    gas: bool,
}

impl RelayToken {
    fn into_item(self) -> Option<TokenListItem> {
        let address = match Address::new(&self.address) {
            Ok(address) => address,
            Err(e) => {
                warn!("Skipping token {} from the token list: {}", self.symbol, e);
                return None;
            }
        };
        let mut token = Token::new(&self.symbol, &self.name, self.decimals, address);
        token.logo_url = self.logo_uri;
        let status = if self.default {
            TokenListItemStatus::Whitelisted
        } else {
            TokenListItemStatus::Regular
        };
        Some(TokenListItem::new(token, status, self.gas))
    }
}

/// Token list served by the transaction relay over HTTP.
pub struct HttpTokenListService {
    http_client: Client,
    url: String,
}

impl HttpTokenListService {
    pub fn new(url: &str) -> Self {
        Self {
            http_client: Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl TokenListDomainService for HttpTokenListService {
    async fn items(&self) -> Result<Vec<TokenListItem>> {
        info!("Fetching token list from {}", self.url);

        let response = self.http_client.get(&self.url).send().await.map_err(|e| {
            error!("Failed to fetch token list: {}", e);
            WalletError::TokenList(format!("request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Token list API error {}: {}", status, error_text);
            return Err(WalletError::TokenList(format!("{}: {}", status, error_text)));
        }

        let list: TokenListResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token list response: {}", e);
            WalletError::TokenList(format!("invalid response: {}", e))
        })?;

        Ok(list
            .results
            .into_iter()
            .filter_map(RelayToken::into_item)
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Merges a remote token list into the stored one.
///
/// Stored items keep the status the user chose. New items are whitelisted
/// when the remote list marks them as default. Stored items missing from the
/// remote list are dropped unless whitelisted.
pub struct TokenListMerger {
    items: Arc<dyn TokenListItemRepository>,
}

impl TokenListMerger {
    pub fn new(items: Arc<dyn TokenListItemRepository>) -> Self {
        Self { items }
    }

    pub async fn merge(&self, remote: Vec<TokenListItem>) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();
        let mut next_sorting_id = self.items.next_sorting_id().await?;
        let remote_ids: HashSet<TokenID> = remote.iter().map(TokenListItem::id).collect();

        for mut item in remote {
            match self.items.find(&item.id()).await? {
                Some(mut stored) => {
                    stored.token = item.token;
                    stored.can_pay_transaction_fee = item.can_pay_transaction_fee;
                    stored.updated = item.updated;
                    self.items.save(&stored).await?;
                    summary.updated += 1;
                }
                None => {
                    if item.is_whitelisted() {
                        item.sorting_id = Some(next_sorting_id);
                        next_sorting_id += 1;
                    }
                    self.items.save(&item).await?;
                    summary.added += 1;
                }
            }
        }

        for stored in self.items.all().await? {
            if !remote_ids.contains(&stored.id()) && !stored.is_whitelisted() {
                self.items.remove(&stored).await?;
                summary.removed += 1;
            }
        }

        debug!(
            "Merged token list: {} added, {} updated, {} removed",
            summary.added, summary.updated, summary.removed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryTokenListItemRepository;

    fn token(code: &str, last: char) -> Token {
        let address = Address::new(&format!("0x{}", last.to_string().repeat(40))).unwrap();
        Token::new(code, code, 18, address)
    }

    #[test]
    fn parses_relay_payload() {
        let payload = r#"{
            "count": 3,
            "results": [
                {"address": "0x1111111111111111111111111111111111111111", "name": "Gnosis",
                 "symbol": "GNO", "decimals": 18, "logoUri": "https://x/gno.png", "default": true, "gas": true},
                {"address": "0x2222222222222222222222222222222222222222", "name": "OmiseGO",
                 "symbol": "OMG", "decimals": 18, "logoUri": null},
                {"address": "not-an-address", "name": "Broken", "symbol": "BRK", "decimals": 0, "logoUri": null}
            ]
        }"#;
        let response: TokenListResponse = serde_json::from_str(payload).unwrap();
        let items: Vec<_> = response
            .results
            .into_iter()
            .filter_map(RelayToken::into_item)
            .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].status, TokenListItemStatus::Whitelisted);
        assert!(items[0].can_pay_transaction_fee);
        assert_eq!(items[0].token.logo_url.as_deref(), Some("https://x/gno.png"));
        assert_eq!(items[1].status, TokenListItemStatus::Regular);
        assert!(!items[1].can_pay_transaction_fee);
    }

    #[tokio::test]
    async fn keeps_user_status_and_drops_unlisted_regular_items() {
        let repo = Arc::new(InMemoryTokenListItemRepository::new());
        let mut blacklisted = TokenListItem::new(token("GNO", '1'), TokenListItemStatus::Regular, false);
        blacklisted.blacklist();
        let mut pinned = TokenListItem::new(token("OMG", '2'), TokenListItemStatus::Regular, false);
        pinned.whitelist(0);
        let stale = TokenListItem::new(token("OLD", '3'), TokenListItemStatus::Regular, false);
        for item in [&blacklisted, &pinned, &stale] {
            repo.save(item).await.unwrap();
        }

        let remote = vec![
            TokenListItem::new(token("GNO", '1'), TokenListItemStatus::Whitelisted, true),
            TokenListItem::new(token("RDN", '4'), TokenListItemStatus::Whitelisted, false),
            TokenListItem::new(token("MKR", '5'), TokenListItemStatus::Regular, false),
        ];
        let summary = TokenListMerger::new(repo.clone()).merge(remote).await.unwrap();

        assert_eq!(summary, MergeSummary { added: 2, updated: 1, removed: 1 });
        let gno = repo.find(&token("GNO", '1').id()).await.unwrap().unwrap();
        assert_eq!(gno.status, TokenListItemStatus::Blacklisted);
        assert!(gno.can_pay_transaction_fee);
        assert!(repo.find(&token("OMG", '2').id()).await.unwrap().is_some());
        assert!(repo.find(&token("OLD", '3').id()).await.unwrap().is_none());

        let rdn = repo.find(&token("RDN", '4').id()).await.unwrap().unwrap();
        assert_eq!(rdn.sorting_id, Some(1));
        let whitelisted: Vec<_> = repo
            .whitelisted()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.token.code)
            .collect();
        assert_eq!(whitelisted, vec!["OMG", "RDN"]);
    }
}
