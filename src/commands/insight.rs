use anyhow::{Context, Result, bail};

use crate::cli::{InsightArgs, ServiceArgs};
use crate::commands::{connect, flush_notices, output};
use crate::console::ConsoleState;
use crate::insight::{InsightState, class_request, keyword_request};
use crate::model::{ClassStat, InsightRequest, KeywordStat};

fn build_request(args: InsightArgs) -> InsightRequest {
    match &args.category {
        Some(category) => keyword_request(
            &KeywordStat {
                keyword: args.keyword,
                count: args.count,
                ratio: args.ratio,
            },
            category,
        ),
        None => class_request(
            &args.keyword,
            &ClassStat {
                count: args.count,
                ratio: args.ratio,
            },
        ),
    }
}

pub fn run(service: &ServiceArgs, args: InsightArgs) -> Result<()> {
    let api = connect(service)?;
    let mut console = ConsoleState::default();

    let outcome = console
        .request_insight(&api, build_request(args))
        .map(|open| open.is_some());
    flush_notices(&mut console);

    if !outcome.context("failed to get insight")? {
        bail!("insight request was superseded");
    }
    let Some(open) = console.insight() else {
        bail!("insight panel closed before the response arrived");
    };
    match &open.state {
        InsightState::Resolved(text) => output::write_insight(&open.request.keyword, text),
        InsightState::Loading => bail!("insight for {} did not resolve", open.request.keyword),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(category: Option<&str>) -> InsightArgs {
        InsightArgs {
            keyword: "aws".to_string(),
            count: 4,
            ratio: 0.4,
            category: category.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn category_selects_keyword_request() {
        let request = build_request(args(Some("cloud")));
        assert_eq!(request.keyword, "aws");
        assert_eq!(request.category.as_deref(), Some("cloud"));
        assert_eq!(request.count, 4);
    }

    #[test]
    fn missing_category_selects_class_request() {
        let request = build_request(args(None));
        assert_eq!(request.keyword, "aws");
        assert!(request.category.is_none());
        assert_eq!(request.ratio, 0.4);
    }
}
