use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use dom_actions::{wait_for_selector, WaitPolicy};
use mailnav_core_types::{normalize_name, PracticeAttributes, PracticeId, PracticeRecord};
use page_gateway::{PageHandle, PagePort, RawRow};

use crate::errors::ScrapeError;
use crate::selectors;

/// Read the full practice listing. Waits for at least one data row, then
/// extracts and validates every row; malformed rows are dropped, order is
/// kept, and no dedup happens here (the cache merges by identifier).
#[instrument(skip_all, fields(page = %page))]
pub async fn scrape_practice_list(
    port: &dyn PagePort,
    page: &PageHandle,
    policy: &WaitPolicy,
) -> Result<Vec<PracticeRecord>, ScrapeError> {
    wait_for_selector(port, page, selectors::PRACTICE_ROW, policy)
        .await
        .map_err(|err| {
            if err.is_timeout() {
                ScrapeError::ListNotReady
            } else {
                err.into()
            }
        })?;

    let rows = port.extract_rows(page, selectors::PRACTICE_ROW).await?;
    let now = Utc::now();
    let total = rows.len();
    let records: Vec<PracticeRecord> = rows
        .iter()
        .filter_map(|row| parse_row(row, now))
        .collect();
    debug!(total, kept = records.len(), "practice list scraped");
    Ok(records)
}

fn parse_row(row: &RawRow, now: DateTime<Utc>) -> Option<PracticeRecord> {
    let raw_id = row
        .anchor_href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    let Some(identifier) = PracticeId::parse(raw_id) else {
        debug!(href = row.anchor_href, "row dropped: bad identifier");
        return None;
    };
    let display_name = normalize_name(&row.anchor_text);
    if display_name.is_empty() {
        debug!(%identifier, "row dropped: empty name");
        return None;
    }

    let cell = |index: usize| {
        row.cells
            .get(index)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty() && *text != "N/A")
            .map(str::to_string)
    };

    Some(PracticeRecord {
        identifier,
        display_name,
        secondary_code: Default::default(),
        attributes: PracticeAttributes {
            category: cell(0),
            quota: cell(1),
            processed: cell(2),
            tier: cell(3),
        },
        fetched_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use page_gateway::{FakeSite, PageBroker};

    #[tokio::test]
    async fn scrapes_and_validates_rows() {
        let site = FakeSite::new();
        site.set_present(selectors::PRACTICE_ROW);
        site.set_rows(vec![
            RawRow::new(
                " Oak \t Clinic ",
                "/admin/practices/A12345",
                vec!["Dental", "50", "12", "Gold"],
            ),
            // Identifier fails the format check.
            RawRow::new("Bad Practice", "/admin/practices/12345", vec![]),
            // Name collapses to empty.
            RawRow::new("   ", "/admin/practices/B22222", vec![]),
            RawRow::new("Elm Practice", "/admin/practices/B22222/", vec!["Medical", "N/A"]),
        ]);
        let page = site.open("https://admin.example/admin/practices", false).await.unwrap();

        let records = scrape_practice_list(&site, &page, &WaitPolicy::fast())
            .await
            .expect("scrape");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "Oak Clinic");
        assert_eq!(records[0].identifier.as_str(), "A12345");
        assert_eq!(records[0].attributes.category.as_deref(), Some("Dental"));
        assert_eq!(records[0].attributes.tier.as_deref(), Some("Gold"));
        assert_eq!(records[1].identifier.as_str(), "B22222");
        assert_eq!(records[1].attributes.quota, None, "N/A cell reads as absent");
    }

    #[tokio::test]
    async fn reports_list_not_ready_on_timeout() {
        let site = FakeSite::new();
        let page = site.open("https://admin.example/admin/practices", false).await.unwrap();
        let err = scrape_practice_list(&site, &page, &WaitPolicy::fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ListNotReady));
    }
}
