use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::model::{ClassStat, InsightRequest, InsightResponse, KeywordStat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum InsightState {
    Loading,
    Resolved(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenInsight {
    pub ticket: InsightTicket,
    pub request: InsightRequest,
    pub state: InsightState,
}

#[derive(Debug)]
pub enum InsightOutcome {
    Resolved,
    Superseded,
    Failed(UpstreamError),
}

/// Tracks the single insight panel. A newer request replaces the open one,
/// and a late response for a replaced request is dropped.
#[derive(Debug, Default)]
pub struct InsightBroker {
    open: Option<OpenInsight>,
    next_ticket: u64,
}

impl InsightBroker {
    pub fn request_for(&mut self, request: InsightRequest) -> InsightTicket {
        self.next_ticket += 1;
        let ticket = InsightTicket(self.next_ticket);

        if let Some(previous) = &self.open {
            debug!(keyword = %previous.request.keyword, "replacing open insight request");
        }

        self.open = Some(OpenInsight {
            ticket,
            request,
            state: InsightState::Loading,
        });
        ticket
    }

    pub fn complete(
        &mut self,
        ticket: InsightTicket,
        result: Result<InsightResponse, UpstreamError>,
    ) -> InsightOutcome {
        let Some(open) = self.open.as_mut().filter(|open| open.ticket == ticket) else {
            debug!(ticket = ticket.0, "discarding response for superseded insight request");
            return InsightOutcome::Superseded;
        };

        match result {
            Ok(response) => {
                open.state = InsightState::Resolved(response.insight);
                InsightOutcome::Resolved
            }
            Err(err) => {
                warn!(keyword = %open.request.keyword, error = %err, "insight request failed");
                self.open = None;
                InsightOutcome::Failed(err)
            }
        }
    }

    pub fn open(&self) -> Option<&OpenInsight> {
        self.open.as_ref()
    }
}

pub fn keyword_request(stat: &KeywordStat, category: &str) -> InsightRequest {
    InsightRequest {
        keyword: stat.keyword.clone(),
        count: stat.count,
        ratio: stat.ratio,
        category: Some(category.to_string()),
    }
}

pub fn class_request(label: &str, stat: &ClassStat) -> InsightRequest {
    InsightRequest {
        keyword: label.to_string(),
        count: stat.count,
        ratio: stat.ratio,
        category: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(broker: &mut InsightBroker, keyword: &str, category: Option<&str>) -> InsightTicket {
        broker.request_for(InsightRequest {
            keyword: keyword.to_string(),
            count: 3,
            ratio: 0.5,
            category: category.map(ToOwned::to_owned),
        })
    }

    fn is_loading(broker: &InsightBroker) -> bool {
        broker
            .open()
            .is_some_and(|open| open.state == InsightState::Loading)
    }

    fn response(keyword: &str, insight: &str) -> InsightResponse {
        InsightResponse {
            keyword: keyword.to_string(),
            insight: insight.to_string(),
        }
    }

    #[test]
    fn request_marks_loading_then_resolves() {
        let mut broker = InsightBroker::default();
        let ticket = request(&mut broker, "rust", Some("lang"));
        assert!(is_loading(&broker));

        let outcome = broker.complete(ticket, Ok(response("rust", "systems language")));
        assert!(matches!(outcome, InsightOutcome::Resolved));
        assert!(!is_loading(&broker));

        let open = broker.open().expect("panel stays open");
        assert_eq!(open.state, InsightState::Resolved("systems language".to_string()));
        assert_eq!(open.request.category.as_deref(), Some("lang"));
    }

    #[test]
    fn new_request_replaces_pending_one_and_late_response_is_dropped() {
        let mut broker = InsightBroker::default();
        let first = request(&mut broker, "rust", None);
        let second = request(&mut broker, "go", None);

        let outcome = broker.complete(first, Ok(response("rust", "late")));
        assert!(matches!(outcome, InsightOutcome::Superseded));
        assert!(is_loading(&broker));
        assert_eq!(broker.open().map(|open| open.ticket), Some(second));

        broker.complete(second, Ok(response("go", "concurrency")));
        assert_eq!(
            broker.open().map(|open| open.state.clone()),
            Some(InsightState::Resolved("concurrency".to_string()))
        );
    }

    #[test]
    fn failure_closes_panel_and_is_reported_once() {
        let mut broker = InsightBroker::default();
        let ticket = request(&mut broker, "rust", None);

        let outcome = broker.complete(
            ticket,
            Err(UpstreamError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        );
        assert!(matches!(outcome, InsightOutcome::Failed(UpstreamError::Status { status: 502, .. })));
        assert!(broker.open().is_none());

        let repeat = broker.complete(ticket, Err(UpstreamError::Decode("again".to_string())));
        assert!(matches!(repeat, InsightOutcome::Superseded));
    }

    #[test]
    fn stat_requests_carry_counts_and_ratios() {
        let keyword = keyword_request(
            &KeywordStat {
                keyword: "aws".to_string(),
                count: 4,
                ratio: 0.4,
            },
            "cloud",
        );
        assert_eq!(keyword.category.as_deref(), Some("cloud"));
        assert_eq!(keyword.count, 4);

        let class = class_request("foreigner", &ClassStat { count: 2, ratio: 0.2 });
        assert_eq!(class.keyword, "foreigner");
        assert!(class.category.is_none());
    }
}
