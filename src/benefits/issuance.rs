//! Benefit eligibility and issuance.
//!
//! # Responsibilities
//! - Select benefits for a recorded donation: an explicit donor-chosen
//!   subset (re-validated at issuance time) or an automatic eligibility scan
//! - Mint each benefit independently: one failure never blocks the others
//!   or the parent donation
//! - Reserve supply with an atomic compare-and-increment before submission
//!   so issued supply can never exceed total supply under concurrency
//! - Write a TransactionLog row for every attempt, success or failure

use std::sync::Arc;
use uuid::Uuid;

use crate::benefits::types::{BenefitDefinition, BenefitHolding};
use crate::custody::issuer::IssuerCustodian;
use crate::donations::types::Donation;
use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;
use crate::ledger::factory::TxFactory;
use crate::ledger::horizon::{HorizonClient, SubmitResult};
use crate::settlement::service::SettlementService;
use crate::signing::orchestrator::SigningOrchestrator;
use crate::store::{Store, TransactionLog, TxType};

/// One benefit that could not be issued, with the reason preserved.
#[derive(Debug)]
pub struct SkippedBenefit {
    pub benefit_id: String,
    pub error: EngineError,
}

/// Outcome of issuing benefits for one donation.
#[derive(Debug, Default)]
pub struct IssuanceReport {
    pub issued: Vec<BenefitHolding>,
    pub skipped: Vec<SkippedBenefit>,
}

pub struct BenefitIssuer {
    store: Arc<dyn Store>,
    custodian: Arc<IssuerCustodian>,
    factory: Arc<TxFactory>,
    settlement: Arc<SettlementService>,
    horizon: Arc<HorizonClient>,
}

impl BenefitIssuer {
    pub fn new(
        store: Arc<dyn Store>,
        custodian: Arc<IssuerCustodian>,
        factory: Arc<TxFactory>,
        settlement: Arc<SettlementService>,
        horizon: Arc<HorizonClient>,
    ) -> Self {
        Self {
            store,
            custodian,
            factory,
            settlement,
            horizon,
        }
    }

    /// Issue every benefit the donation qualifies for.
    ///
    /// With `selected` the donor's choice is honored but re-validated; a
    /// benefit that stopped qualifying since selection is skipped, not
    /// issued. Without it, all qualifying definitions are scanned.
    pub async fn issue_for_donation(
        &self,
        donation: &Donation,
        selected: Option<&[String]>,
    ) -> Result<IssuanceReport> {
        let mut report = IssuanceReport::default();
        let candidates = self.candidates(donation, selected, &mut report).await?;

        for benefit in candidates {
            match self.issue_one(donation, &benefit).await {
                Ok(holding) => report.issued.push(holding),
                Err(error) => {
                    tracing::warn!(
                        benefit = %benefit.id,
                        donation = %donation.id,
                        error = %error,
                        "Benefit skipped"
                    );
                    report.skipped.push(SkippedBenefit {
                        benefit_id: benefit.id.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    async fn candidates(
        &self,
        donation: &Donation,
        selected: Option<&[String]>,
        report: &mut IssuanceReport,
    ) -> Result<Vec<BenefitDefinition>> {
        match selected {
            Some(ids) => {
                let mut out = Vec::with_capacity(ids.len());
                for id in ids {
                    let benefit = match self.store.benefit(id).await? {
                        Some(b) if b.project_id == donation.project_id => b,
                        _ => {
                            report.skipped.push(SkippedBenefit {
                                benefit_id: id.clone(),
                                error: EngineError::IssuanceFailed {
                                    benefit_id: id.clone(),
                                    reason: "unknown benefit for this project".into(),
                                },
                            });
                            continue;
                        }
                    };
                    if !benefit.qualifies(donation.amount, &donation.asset) {
                        report.skipped.push(SkippedBenefit {
                            benefit_id: id.clone(),
                            error: EngineError::IssuanceFailed {
                                benefit_id: id.clone(),
                                reason: "no longer eligible at issuance time".into(),
                            },
                        });
                        continue;
                    }
                    out.push(benefit);
                }
                Ok(out)
            }
            None => {
                let all = self.store.benefits_for_project(&donation.project_id).await?;
                Ok(all
                    .into_iter()
                    .filter(|b| b.qualifies(donation.amount, &donation.asset))
                    .collect())
            }
        }
    }

    /// Mint one benefit unit to the donor.
    async fn issue_one(
        &self,
        donation: &Donation,
        benefit: &BenefitDefinition,
    ) -> Result<BenefitHolding> {
        let issuer = self.custodian.ensure_issuer(&donation.project_id).await?;
        let benefit_asset = Asset::credit(&benefit.asset_code, &issuer.public_key)?;

        // A wallet without the trustline would be rejected by the ledger
        // with op_no_trust; checking first keeps the diagnostic crisp and
        // spares the issuer a burned sequence number.
        if !self.horizon.has_trustline(&donation.donor_wallet, &benefit_asset).await? {
            let error = EngineError::IssuanceFailed {
                benefit_id: benefit.id.clone(),
                reason: format!(
                    "donor wallet holds no trustline to {}; establish it and retry",
                    benefit_asset
                ),
            };
            self.store
                .append_tx_log(TransactionLog::failure(TxType::Issuance, None, error.to_string()))
                .await?;
            return Err(error);
        }

        // Reserve before submitting; release on failure. The other order
        // can oversell between submission and increment.
        if !self.store.reserve_benefit_supply(&benefit.id, 1).await? {
            let error = EngineError::IssuanceFailed {
                benefit_id: benefit.id.clone(),
                reason: "supply exhausted".into(),
            };
            self.store
                .append_tx_log(TransactionLog::failure(TxType::Issuance, None, error.to_string()))
                .await?;
            return Err(error);
        }

        match self.mint(donation, benefit, &issuer.public_key).await {
            Ok(result) => {
                let holding = BenefitHolding {
                    id: Uuid::new_v4().to_string(),
                    benefit_id: benefit.id.clone(),
                    donation_id: donation.id.clone(),
                    holder_wallet: donation.donor_wallet.clone(),
                    quantity: 1,
                };
                self.store.insert_holding(holding.clone()).await?;
                self.store
                    .append_tx_log(TransactionLog::success(TxType::Issuance, result.hash.clone()))
                    .await?;
                tracing::info!(
                    benefit = %benefit.id,
                    donation = %donation.id,
                    hash = %result.hash,
                    "Benefit issued"
                );
                Ok(holding)
            }
            Err(error) => {
                self.store.release_benefit_supply(&benefit.id, 1).await?;
                self.store
                    .append_tx_log(TransactionLog::failure(TxType::Issuance, None, error.to_string()))
                    .await?;
                Err(EngineError::IssuanceFailed {
                    benefit_id: benefit.id.clone(),
                    reason: error.to_string(),
                })
            }
        }
    }

    async fn mint(
        &self,
        donation: &Donation,
        benefit: &BenefitDefinition,
        issuer_key: &str,
    ) -> Result<SubmitResult> {
        let envelope = self
            .factory
            .build_issuance(
                issuer_key,
                &donation.donor_wallet,
                &benefit.asset_code,
                Amount::from_stroops(crate::ledger::amount::STROOPS_PER_UNIT)?,
            )
            .await?;
        let signed = self
            .custodian
            .sign_as_issuer(&donation.project_id, &envelope)
            .await?;
        self.settlement.submit(&signed).await
    }

    /// Drive the trustline-establishment flow for a donor wallet: build one
    /// batched change-trust envelope, have the donor's wallet sign it,
    /// submit, then confirm settlement with bounded retry.
    pub async fn establish_trustlines(
        &self,
        signer: &SigningOrchestrator,
        trustor: &str,
        assets: &[Asset],
    ) -> Result<SubmitResult> {
        let envelope = self.factory.build_trustline(trustor, assets).await?;
        let signed = signer.sign(&envelope).await?;
        let result = match self.settlement.submit(&signed).await {
            Ok(result) => {
                self.store
                    .append_tx_log(TransactionLog::success(TxType::Trustline, result.hash.clone()))
                    .await?;
                result
            }
            Err(error) => {
                self.store
                    .append_tx_log(TransactionLog::failure(TxType::Trustline, None, error.to_string()))
                    .await?;
                return Err(error);
            }
        };

        for asset in assets {
            if !self.settlement.confirm_trustline(trustor, asset).await? {
                return Err(EngineError::Horizon(format!(
                    "trustline to {} did not settle within the confirmation window",
                    asset
                )));
            }
        }
        Ok(result)
    }
}
