#![forbid(unsafe_code)]

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mesa_kernel_contracts::pipeline::NormalizeReport;
use mesa_kernel_contracts::staging::{IngestContext, IngestReceipt, StagingRecordInput};
use mesa_kernel_contracts::SourceKind;

use crate::error::CoreError;
use crate::{Pipeline, PipelineStore};

impl<S: PipelineStore> Pipeline<S> {
    /// Validate a raw payload against its source contract and append
    /// it to the staging log. Side effect: one new staging record.
    pub fn ingest(
        &mut self,
        source: SourceKind,
        body: Value,
        ctx: &IngestContext,
    ) -> Result<IngestReceipt, CoreError> {
        let connector = self
            .registry
            .resolve(source)
            .ok_or_else(|| CoreError::NotFound {
                kind: "connector",
                key: source.as_str().to_string(),
            })?;
        connector.validate(&body).map_err(CoreError::Validation)?;

        let record = self.store.append_staging(StagingRecordInput::v1(
            source,
            Some(ctx.org_id.clone()),
            Some(ctx.requested_at),
            body,
        ))?;
        info!(
            source = source.as_str(),
            org = ctx.org_id.as_str(),
            staging_record_id = %record.id,
            "staged raw payload"
        );
        Ok(IngestReceipt {
            staging_record_id: record.id,
            received_at: record.received_at,
        })
    }

    /// Drain the caller's staging records through their connectors and
    /// upsert the canonical output. Re-running against the same staging
    /// set is idempotent in the canonical store; the returned counts
    /// conflate insert and replace.
    pub fn normalize_run(&mut self, ctx: &IngestContext) -> Result<NormalizeReport, CoreError> {
        let mut report = NormalizeReport::default();
        for source in self.registry.sources() {
            let connector = self
                .registry
                .resolve(source)
                .ok_or_else(|| CoreError::NotFound {
                    kind: "connector",
                    key: source.as_str().to_string(),
                })?;

            let staged: Vec<(Uuid, Value)> = self
                .store
                .staging_by_source(source, Some(&ctx.org_id))
                .into_iter()
                .map(|r| (r.id, r.payload.clone()))
                .collect();

            for (record_id, payload) in staged {
                report.processed += 1;
                let batch = match connector.to_canonical(&payload, ctx) {
                    Ok(batch) => batch,
                    Err(violation) => {
                        // The replay log keeps the record; it only
                        // blocks this run's output, not the run itself.
                        warn!(
                            source = source.as_str(),
                            staging_record_id = %record_id,
                            ?violation,
                            "staging record failed canonicalization, skipped"
                        );
                        report.skipped += 1;
                        continue;
                    }
                };
                debug!(
                    source = source.as_str(),
                    staging_record_id = %record_id,
                    menu_items = batch.menu_items.len(),
                    occupancy_signals = batch.occupancy_signals.len(),
                    profiles = batch.profiles.len(),
                    "canonicalized staging record"
                );
                report.menu_items_upserted += self.store.upsert_menu_items(batch.menu_items)?;
                report.occupancy_signals_upserted +=
                    self.store.upsert_occupancy_signals(batch.occupancy_signals)?;
                report.profiles_upserted += self.store.upsert_profiles(batch.profiles)?;
            }
        }
        info!(
            org = ctx.org_id.as_str(),
            processed = report.processed,
            menu_items = report.menu_items_upserted,
            occupancy_signals = report.occupancy_signals_upserted,
            profiles = report.profiles_upserted,
            skipped = report.skipped,
            "normalization run finished"
        );
        Ok(report)
    }
}
