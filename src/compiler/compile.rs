//! Request -> (query tree, options).

use time::{OffsetDateTime, PrimitiveDateTime};

use super::request::{
    CludeRecv, EndpointMetricRecv, EndpointsRecv, IndexByFullTagsRecv, QueryData, QueryDataForUi,
};
use crate::config::IndexConfig;
use crate::filter::{
    counter_filter, disjunction_or_all, endpoints_filter, exclude_tags_filter,
    include_tags_filter, metric_filter, metrics_filter, tags_filter,
};
use crate::query::{
    AggregationOptions, AggregationType, CompiledAggregation, CompiledQuery, QueryNode,
    QueryOptions,
};

/// Compiles requests into index queries.
///
/// Holds only the immutable field names and limits, so one instance can be
/// shared freely across threads. Compilation never fails: malformed entries
/// are skipped and missing criteria widen the query to `*`.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: IndexConfig,
}

/// Seconds since the epoch, clamped to the nearest representable instant.
fn unix_time(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap_or_else(|_| {
        let bound = if secs < 0 {
            PrimitiveDateTime::MIN.assume_utc()
        } else {
            PrimitiveDateTime::MAX.assume_utc()
        };
        tracing::warn!("Compiler: timestamp {} out of range, clamped to {}", secs, bound);
        bound
    })
}

impl QueryCompiler {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// `||(&&(endpoints, counters), ...)` over the inputs.
    ///
    /// The time window is taken from the first input. An empty batch
    /// compiles to `*` over `[epoch, now)`.
    pub fn query_data(&self, inputs: &[QueryData]) -> CompiledQuery {
        let fields = &self.config.fields;
        let q = inputs
            .iter()
            .map(|input| {
                QueryNode::conjunction(vec![
                    endpoints_filter(fields, &input.nids, &input.endpoints),
                    counter_filter(fields, &input.counters),
                ])
            })
            .collect();

        let options = match inputs.first() {
            Some(first) => {
                QueryOptions::window(unix_time(first.start), unix_time(first.end), &self.config.limits)
            }
            None => QueryOptions::since_epoch(&self.config.limits),
        };

        self.finish(disjunction_or_all(q), options)
    }

    /// `&&(metric, endpoints, ||(tags...))`
    pub fn query_data_for_ui(&self, input: &QueryDataForUi) -> CompiledQuery {
        let fields = &self.config.fields;
        let query = QueryNode::conjunction(vec![
            metric_filter(fields, &input.metric),
            endpoints_filter(fields, &input.nids, &input.endpoints),
            tags_filter(&input.tags),
        ]);

        self.finish(
            query,
            QueryOptions::window(unix_time(input.start), unix_time(input.end), &self.config.limits),
        )
    }

    /// `&&(||(endpoints...), metric=*)`, aggregated over the metric field.
    pub fn query_metrics(&self, input: &EndpointsRecv) -> CompiledAggregation {
        let fields = &self.config.fields;
        let query = QueryNode::conjunction(vec![
            endpoints_filter(fields, &[], &input.endpoints),
            QueryNode::field(&fields.metric),
        ]);

        self.finish_aggregation(query, Some(vec![fields.metric.clone()]))
    }

    /// `&&(||(endpoints...), ||(metrics...))`, aggregated over every field.
    pub fn query_tag_pairs(&self, input: &EndpointMetricRecv) -> CompiledAggregation {
        let fields = &self.config.fields;
        let query = QueryNode::conjunction(vec![
            endpoints_filter(fields, &[], &input.endpoints),
            metrics_filter(fields, &input.metrics),
        ]);

        self.finish_aggregation(query, None)
    }

    /// `||(endpoints, metric, include, exclude)` over the criteria present.
    ///
    /// The criteria are OR-ed: a series matching any one of them is
    /// returned. `query_index_by_full_tags` AND-s its criteria instead; the
    /// two must not be unified.
    pub fn query_index_by_clude(&self, input: &CludeRecv) -> CompiledQuery {
        let fields = &self.config.fields;
        let mut q = Vec::new();

        if !input.endpoints.is_empty() {
            q.push(endpoints_filter(fields, &[], &input.endpoints));
        }
        if !input.metric.is_empty() {
            q.push(metric_filter(fields, &input.metric));
        }
        if !input.include.is_empty() {
            q.push(include_tags_filter(&input.include));
        }
        if !input.exclude.is_empty() {
            q.push(exclude_tags_filter(&input.exclude));
        }

        let query = if q.is_empty() {
            QueryNode::all()
        } else {
            QueryNode::disjunction(q)
        };

        self.finish(query, QueryOptions::since_epoch(&self.config.limits))
    }

    /// `&&(endpoints, metric, tagkv)` over the criteria present.
    ///
    /// Every present criterion must hold, unlike `query_index_by_clude`.
    pub fn query_index_by_full_tags(&self, input: &IndexByFullTagsRecv) -> CompiledQuery {
        let fields = &self.config.fields;
        let mut q = Vec::new();

        if !input.endpoints.is_empty() {
            q.push(endpoints_filter(fields, &[], &input.endpoints));
        }
        if !input.metric.is_empty() {
            q.push(metric_filter(fields, &input.metric));
        }
        if !input.tagkv.is_empty() {
            q.push(include_tags_filter(&input.tagkv.to_pairs()));
        }

        let query = if q.is_empty() {
            QueryNode::all()
        } else {
            QueryNode::conjunction(q)
        };

        self.finish(query, QueryOptions::since_epoch(&self.config.limits))
    }

    fn finish(&self, query: QueryNode, options: QueryOptions) -> CompiledQuery {
        tracing::trace!("Compiler: {}", query);
        CompiledQuery { query, options }
    }

    fn finish_aggregation(
        &self,
        query: QueryNode,
        field_filter: Option<Vec<String>>,
    ) -> CompiledAggregation {
        tracing::trace!("Compiler: aggregate {}", query);
        CompiledAggregation {
            query,
            options: AggregationOptions {
                query: QueryOptions::since_epoch(&self.config.limits),
                field_filter,
                aggregation_type: AggregationType::TagNamesAndValues,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::TagKv;
    use crate::config::{FieldNames, Limits};
    use crate::filter::TagPair;
    use crate::query::evaluate;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn doc(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn compiler() -> QueryCompiler {
        QueryCompiler::default()
    }

    fn assert_recent(opts: &QueryOptions) {
        let now = OffsetDateTime::now_utc();
        assert_eq!(opts.start_inclusive, OffsetDateTime::UNIX_EPOCH);
        assert!(opts.end_exclusive <= now);
        assert!(now - opts.end_exclusive < time::Duration::seconds(5));
    }

    #[test]
    fn test_query_data() {
        let inputs = vec![
            QueryData {
                start: 100,
                end: 200,
                endpoints: strings(&["e1"]),
                counters: strings(&["cpu.idle/host=a"]),
                ..Default::default()
            },
            QueryData {
                start: 999,
                end: 1999,
                nids: strings(&["7"]),
                ..Default::default()
            },
        ];
        let compiled = compiler().query_data(&inputs);

        assert_eq!(
            compiled.query,
            QueryNode::disjunction(vec![
                QueryNode::conjunction(vec![
                    QueryNode::disjunction(vec![QueryNode::term("__endpoint__", "e1")]),
                    QueryNode::disjunction(vec![QueryNode::conjunction(vec![
                        QueryNode::term("__name__", "cpu.idle"),
                        QueryNode::term("host", "a"),
                    ])]),
                ]),
                QueryNode::conjunction(vec![
                    QueryNode::disjunction(vec![QueryNode::term("__nid__", "7")]),
                    QueryNode::All,
                ]),
            ])
        );
        assert_eq!(compiled.options.start_inclusive.unix_timestamp(), 100);
        assert_eq!(compiled.options.end_exclusive.unix_timestamp(), 200);
        assert_eq!(compiled.options.series_limit, 1000);
        assert_eq!(compiled.options.docs_limit, 100);
    }

    #[test]
    fn test_query_data_empty_batch() {
        let compiled = compiler().query_data(&[]);
        assert_eq!(compiled.query, QueryNode::All);
        assert_recent(&compiled.options);
    }

    #[test]
    fn test_too_small_timestamp_clamps_to_lower_bound() {
        let compiled = compiler().query_data(&[QueryData {
            start: i64::MIN,
            end: 10,
            ..Default::default()
        }]);
        assert_eq!(
            compiled.options.start_inclusive,
            PrimitiveDateTime::MIN.assume_utc()
        );
        assert_eq!(compiled.options.end_exclusive.unix_timestamp(), 10);
    }

    #[test]
    fn test_huge_end_clamps_to_upper_bound() {
        let compiled = compiler().query_data(&[QueryData {
            start: 1_600_000_000,
            end: 1_600_000_000_000,
            ..Default::default()
        }]);
        let options = &compiled.options;
        assert_eq!(options.start_inclusive.unix_timestamp(), 1_600_000_000);
        assert_eq!(options.end_exclusive, PrimitiveDateTime::MAX.assume_utc());
        assert!(options.end_exclusive > options.start_inclusive);
    }

    #[test]
    fn test_far_past_window_serializes() {
        let compiled = compiler().query_data_for_ui(&QueryDataForUi {
            start: -100_000_000_000,
            end: 1_600_000_000,
            ..Default::default()
        });
        let json = serde_json::to_value(&compiled).unwrap();
        assert_eq!(
            json["options"]["start_inclusive"],
            compiled.options.start_inclusive.unix_timestamp()
        );
        assert_eq!(json["options"]["end_exclusive"], 1_600_000_000);
    }

    #[test]
    fn test_query_data_for_ui() {
        let input = QueryDataForUi {
            start: 1,
            end: 2,
            metric: "cpu.idle".into(),
            endpoints: strings(&["e1", "e2"]),
            tags: strings(&["host=a", "host=b"]),
            ..Default::default()
        };
        let compiled = compiler().query_data_for_ui(&input);

        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::term("__name__", "cpu.idle"),
                QueryNode::disjunction(vec![
                    QueryNode::term("__endpoint__", "e1"),
                    QueryNode::term("__endpoint__", "e2"),
                ]),
                QueryNode::disjunction(vec![
                    QueryNode::conjunction(vec![QueryNode::term("host", "a")]),
                    QueryNode::conjunction(vec![QueryNode::term("host", "b")]),
                ]),
            ])
        );
        assert_eq!(compiled.options.start_inclusive.unix_timestamp(), 1);
        assert_eq!(compiled.options.end_exclusive.unix_timestamp(), 2);
    }

    #[test]
    fn test_query_data_for_ui_without_filters() {
        let input = QueryDataForUi {
            metric: "cpu.idle".into(),
            ..Default::default()
        };
        let compiled = compiler().query_data_for_ui(&input);
        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::term("__name__", "cpu.idle"),
                QueryNode::All,
                QueryNode::All,
            ])
        );
    }

    #[test]
    fn test_query_metrics() {
        let compiled = compiler().query_metrics(&EndpointsRecv {
            endpoints: strings(&["e1"]),
        });
        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::disjunction(vec![QueryNode::term("__endpoint__", "e1")]),
                QueryNode::field("__name__"),
            ])
        );
        assert_eq!(
            compiled.options.field_filter,
            Some(vec!["__name__".to_string()])
        );
        assert_eq!(
            compiled.options.aggregation_type,
            AggregationType::TagNamesAndValues
        );
        assert_recent(&compiled.options.query);
    }

    #[test]
    fn test_query_tag_pairs() {
        let compiled = compiler().query_tag_pairs(&EndpointMetricRecv {
            endpoints: vec![],
            metrics: strings(&["cpu.idle", "mem.used"]),
        });
        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::All,
                QueryNode::disjunction(vec![
                    QueryNode::term("__name__", "cpu.idle"),
                    QueryNode::term("__name__", "mem.used"),
                ]),
            ])
        );
        assert_eq!(compiled.options.field_filter, None);
        assert_eq!(
            compiled.options.aggregation_type,
            AggregationType::TagNamesAndValues
        );
        assert_recent(&compiled.options.query);
    }

    #[test]
    fn test_clude_without_criteria_matches_all() {
        let compiled = compiler().query_index_by_clude(&CludeRecv::default());
        assert_eq!(compiled.query, QueryNode::All);
        assert_eq!(compiled.options.series_limit, 1000);
        assert_eq!(compiled.options.docs_limit, 100);
        assert_recent(&compiled.options);
    }

    #[test]
    fn test_clude_ors_criteria() {
        let input = CludeRecv {
            endpoints: strings(&["e1"]),
            include: vec![TagPair::new("host", &["a"])],
            ..Default::default()
        };
        let compiled = compiler().query_index_by_clude(&input);

        assert_eq!(
            compiled.query,
            QueryNode::disjunction(vec![
                QueryNode::disjunction(vec![QueryNode::term("__endpoint__", "e1")]),
                QueryNode::conjunction(vec![QueryNode::disjunction(vec![QueryNode::term(
                    "host", "a"
                )])]),
            ])
        );

        // endpoint only
        assert!(evaluate(&compiled.query, &doc(&[("__endpoint__", "e1"), ("host", "z")])));
        // include only
        assert!(evaluate(&compiled.query, &doc(&[("__endpoint__", "e9"), ("host", "a")])));
        assert!(!evaluate(&compiled.query, &doc(&[("__endpoint__", "e9"), ("host", "z")])));
    }

    #[test]
    fn test_clude_all_criteria() {
        let input = CludeRecv {
            endpoints: strings(&["e1"]),
            metric: "cpu.idle".into(),
            include: vec![TagPair::new("host", &["a"])],
            exclude: vec![TagPair::new("dc", &["x"])],
        };
        let compiled = compiler().query_index_by_clude(&input);
        let QueryNode::Disjunction(children) = &compiled.query else {
            panic!("expected disjunction, got {}", compiled.query);
        };
        assert_eq!(children.len(), 4);
        assert_eq!(children[1], QueryNode::term("__name__", "cpu.idle"));
        assert_eq!(
            children[3],
            exclude_tags_filter(&[TagPair::new("dc", &["x"])])
        );
    }

    #[test]
    fn test_full_tags_without_criteria_matches_all() {
        let compiled = compiler().query_index_by_full_tags(&IndexByFullTagsRecv::default());
        assert_eq!(compiled.query, QueryNode::All);
        assert_recent(&compiled.options);
    }

    #[test]
    fn test_full_tags_ands_criteria() {
        let input = IndexByFullTagsRecv {
            endpoints: strings(&["e1"]),
            tagkv: TagKv::Pairs(vec![TagPair::new("host", &["a"])]),
            ..Default::default()
        };
        let compiled = compiler().query_index_by_full_tags(&input);

        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::disjunction(vec![QueryNode::term("__endpoint__", "e1")]),
                QueryNode::conjunction(vec![QueryNode::disjunction(vec![QueryNode::term(
                    "host", "a"
                )])]),
            ])
        );

        assert!(evaluate(&compiled.query, &doc(&[("__endpoint__", "e1"), ("host", "a")])));
        assert!(!evaluate(&compiled.query, &doc(&[("__endpoint__", "e1"), ("host", "z")])));
        assert!(!evaluate(&compiled.query, &doc(&[("__endpoint__", "e9"), ("host", "a")])));
    }

    #[test]
    fn test_clude_and_full_tags_differ_on_same_criteria() {
        let c = compiler();
        let clude = c.query_index_by_clude(&CludeRecv {
            endpoints: strings(&["e1"]),
            metric: "cpu.idle".into(),
            ..Default::default()
        });
        let full = c.query_index_by_full_tags(&IndexByFullTagsRecv {
            endpoints: strings(&["e1"]),
            metric: "cpu.idle".into(),
            ..Default::default()
        });

        let only_endpoint = doc(&[("__endpoint__", "e1"), ("__name__", "mem.used")]);
        assert!(evaluate(&clude.query, &only_endpoint));
        assert!(!evaluate(&full.query, &only_endpoint));
    }

    #[test]
    fn test_compilation_is_repeatable() {
        let c = compiler();
        let input = QueryData {
            start: 1,
            end: 2,
            nids: strings(&["1", "2"]),
            counters: strings(&["cpu.load/host=a,dc=b,rack=r1", "junk"]),
            ..Default::default()
        };
        assert_eq!(
            c.query_data(std::slice::from_ref(&input)),
            c.query_data(std::slice::from_ref(&input))
        );

        let ui = QueryDataForUi {
            metric: "m".into(),
            tags: strings(&["a=1,b=2,c=3"]),
            ..Default::default()
        };
        assert_eq!(
            c.query_data_for_ui(&ui).query,
            c.query_data_for_ui(&ui).query
        );
    }

    #[test]
    fn test_custom_fields_and_limits() {
        let c = QueryCompiler::new(IndexConfig {
            fields: FieldNames {
                metric: "metric".into(),
                nid: "nid".into(),
                endpoint: "ident".into(),
            },
            limits: Limits { series: 5, docs: 2 },
        });
        let compiled = c.query_index_by_full_tags(&IndexByFullTagsRecv {
            endpoints: strings(&["e1"]),
            metric: "cpu.idle".into(),
            ..Default::default()
        });
        assert_eq!(
            compiled.query,
            QueryNode::conjunction(vec![
                QueryNode::disjunction(vec![QueryNode::term("ident", "e1")]),
                QueryNode::term("metric", "cpu.idle"),
            ])
        );
        assert_eq!(compiled.options.series_limit, 5);
        assert_eq!(compiled.options.docs_limit, 2);
    }
}
