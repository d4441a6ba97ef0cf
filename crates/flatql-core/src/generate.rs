//! Module: generate
//! Responsibility: the outer boundary. Validates inputs, runs the stages in
//! order, and turns every failure into comment-only diagnostic text.
//! Does not own: any stage's rules.

use crate::{
    compile::compile,
    condition::parse_conditions,
    config::GeneratorConfig,
    error::{Error, GenerateError},
    flatten,
    obs::sink::{MetricsEvent, Span, record},
    resolve::resolve,
    sanitize::is_bare_identifier,
    schema::{SampleFetcher, Schema, SchemaCache, SchemaInferencer, SourceKey},
};
use std::sync::Arc;

///
/// Generator
///
/// One configuration bound to one schema cache. The free functions use the
/// process-wide cache.
///

pub struct Generator<'a> {
    cache: &'a SchemaCache,
    config: GeneratorConfig,
}

impl Generator<'static> {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_cache(SchemaCache::global(), config)
    }
}

impl<'a> Generator<'a> {
    #[must_use]
    pub const fn with_cache(cache: &'a SchemaCache, config: GeneratorConfig) -> Self {
        Self { cache, config }
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate query text, or a comment-only diagnostic on any failure.
    #[must_use]
    pub fn generate(
        &self,
        source: &str,
        column: &str,
        conditions: &str,
        fetcher: &dyn SampleFetcher,
    ) -> String {
        self.try_generate(source, column, conditions, fetcher)
            .unwrap_or_else(|err| err.to_comment())
    }

    /// Generate query text, surfacing failures as a typed `Error`.
    pub fn try_generate(
        &self,
        source: &str,
        column: &str,
        conditions: &str,
        fetcher: &dyn SampleFetcher,
    ) -> Result<String, Error> {
        let mut span = Span::new();

        match self.run(source, column, conditions, fetcher) {
            Ok(sql) => {
                span.succeed();
                Ok(sql)
            }
            Err(err) => {
                let err = Error::from(err);
                record(MetricsEvent::GenerateFailed {
                    kind: err.kind.as_str(),
                });
                tracing::warn!(
                    source,
                    column,
                    kind = %err.kind,
                    origin = %err.origin,
                    error = %err.message,
                    "query generation failed"
                );
                Err(err)
            }
        }
    }

    /// Infer (or fetch from cache) the schema for one source column.
    pub fn describe(
        &self,
        source: &str,
        column: &str,
        fetcher: &dyn SampleFetcher,
    ) -> Result<Arc<Schema>, Error> {
        let key = source_key(source, column)?;

        SchemaInferencer::new(self.cache, &self.config)
            .infer(&key, fetcher)
            .map_err(|err| GenerateError::from(err).into())
    }

    fn run(
        &self,
        source: &str,
        column: &str,
        conditions: &str,
        fetcher: &dyn SampleFetcher,
    ) -> Result<String, GenerateError> {
        let key =
            source_key(source, column).map_err(|err| GenerateError::InvalidInput(err.message))?;

        let conditions = parse_conditions(conditions)?;
        if conditions.is_empty() {
            return Err(GenerateError::InvalidInput(
                "no field conditions provided".to_string(),
            ));
        }

        let schema = SchemaInferencer::new(self.cache, &self.config).infer(&key, fetcher)?;

        let fields = conditions
            .into_iter()
            .map(|condition| {
                let resolved = resolve(&schema, &condition.field)?;
                Ok((condition, resolved))
            })
            .collect::<Result<Vec<_>, GenerateError>>()?;

        let plan = flatten::plan(fields.iter().flat_map(|(_, resolved)| resolved.array_paths()));
        tracing::debug!(%key, fields = fields.len(), flattens = plan.len(), "planned query");

        let sql = compile(source, column, &fields, &plan)?;
        tracing::info!(%key, fields = fields.len(), "generated query");

        Ok(sql)
    }
}

fn source_key(source: &str, column: &str) -> Result<SourceKey, Error> {
    if source.trim().is_empty() {
        return Err(Error::invalid_input("source name must not be empty"));
    }
    if column.trim().is_empty() {
        return Err(Error::invalid_input("column name must not be empty"));
    }
    if !is_bare_identifier(column) {
        return Err(Error::invalid_input(format!(
            "column '{column}' must be a plain identifier"
        )));
    }

    Ok(SourceKey::new(source, column))
}

/// Generate query text against the process-wide schema cache.
///
/// Never fails: any error comes back as comment-only diagnostic text.
#[must_use]
pub fn generate(
    source: &str,
    column: &str,
    conditions: &str,
    fetcher: &dyn SampleFetcher,
    config: &GeneratorConfig,
) -> String {
    Generator::new(config.clone()).generate(source, column, conditions, fetcher)
}

/// Fallible form of [`generate`].
pub fn try_generate(
    source: &str,
    column: &str,
    conditions: &str,
    fetcher: &dyn SampleFetcher,
    config: &GeneratorConfig,
) -> Result<String, Error> {
    Generator::new(config.clone()).try_generate(source, column, conditions, fetcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        obs::{MetricsSink, with_metrics_sink},
        test_support::ScriptedFetcher,
    };
    use serde_json::{Value, json};
    use std::{cell::RefCell, rc::Rc};

    fn catalog() -> Vec<Value> {
        vec![
            json!({
                "height": 20,
                "product_id": "P200",
                "name": "Widget",
                "owner": { "team": { "name": "core" } },
                "orders": [{ "id": 1, "items": [{ "price": 9.5, "sku": "A" }] }]
            }),
            json!({
                "height": 30,
                "product_id": "P300",
                "name": "Gadget",
                "owner": { "team": { "name": "edge" } },
                "orders": []
            }),
        ]
    }

    fn generate_local(conditions: &str, fetcher: &ScriptedFetcher) -> Result<String, Error> {
        let cache = SchemaCache::new();
        Generator::with_cache(&cache, GeneratorConfig::default())
            .try_generate("PRODUCTS", "DOC", conditions, fetcher)
    }

    fn generate_column(
        column: &str,
        conditions: &str,
        fetcher: &ScriptedFetcher,
    ) -> Result<String, Error> {
        let cache = SchemaCache::new();
        Generator::with_cache(&cache, GeneratorConfig::default())
            .try_generate("PRODUCTS", column, conditions, fetcher)
    }

    #[test]
    fn height_and_product_scenario() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let sql = generate_local("height[IN:10|30,CAST:INTEGER],product_id[=:P200]", &fetcher)
            .unwrap();

        assert_eq!(
            sql,
            "SELECT CAST(DOC:height AS INTEGER) as height, DOC:product_id as product_id\n\
             FROM \"PRODUCTS\"\n\
             WHERE CAST(DOC:height AS INTEGER) IN (10, 30) AND DOC:product_id = 'P200';"
        );
    }

    #[test]
    fn nested_array_scenario_expands_twice() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let sql = generate_local("items.price[BETWEEN:1|10]", &fetcher).unwrap();

        assert_eq!(sql.matches("LATERAL FLATTEN").count(), 2);
        assert!(sql.contains("\n, LATERAL FLATTEN(input => DOC:orders) f1\n"));
        assert!(sql.contains("\n, LATERAL FLATTEN(input => f1.value:items) f2\n"));
        assert!(sql.ends_with("WHERE f2.value:price BETWEEN 1 AND 10;"), "{sql}");
    }

    #[test]
    fn shallowest_name_is_selected() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let sql = generate_local("name", &fetcher).unwrap();

        assert!(sql.starts_with("SELECT DOC:name as name\n"), "{sql}");
        assert!(!sql.contains("owner"));
    }

    #[test]
    fn failures_come_back_as_comment_text() {
        let fetcher = ScriptedFetcher::rows(&catalog());
        let cache = SchemaCache::new();
        let generator = Generator::with_cache(&cache, GeneratorConfig::default());

        let text = generator.generate("PRODUCTS", "DOC", "colour[=:red]", &fetcher);

        assert_eq!(
            text,
            "-- Error in dynamic SQL generation\n\
             -- Error message: FieldNotFound: Field 'colour' not found in JSON structure\n\
             -- Please verify your inputs and try again;"
        );
    }

    #[test]
    fn every_stage_maps_to_its_kind() {
        let cases = [
            ("price[BETWEEN:1|2|3]", ErrorKind::Parse),
            ("colour", ErrorKind::FieldNotFound),
            ("height[LIKE:2%]", ErrorKind::InvalidOperator),
            ("height[CAST:BLOB]", ErrorKind::InvalidCastType),
            ("height[>:tall]", ErrorKind::InvalidValue),
            ("", ErrorKind::InvalidInput),
        ];

        for (conditions, kind) in cases {
            let fetcher = ScriptedFetcher::rows(&catalog());
            let err = generate_local(conditions, &fetcher).expect_err(conditions);
            assert_eq!(err.kind, kind, "{conditions}");
        }
    }

    #[test]
    fn between_arity_names_the_count() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let err = generate_local("height[BETWEEN:1|2|3]", &fetcher).unwrap_err();

        assert!(err.message.contains("got 3"), "{}", err.message);
    }

    #[test]
    fn quotes_are_doubled_in_output() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let sql = generate_local("name[=:O'Brien]", &fetcher).unwrap();

        assert!(sql.contains("DOC:name = 'O''Brien'"), "{sql}");
    }

    #[test]
    fn parse_errors_skip_sampling() {
        let fetcher = ScriptedFetcher::rows(&catalog());

        let _ = generate_local("height[", &fetcher);

        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn blank_source_or_column_is_invalid_input() {
        let fetcher = ScriptedFetcher::rows(&catalog());
        let cache = SchemaCache::new();
        let generator = Generator::with_cache(&cache, GeneratorConfig::default());

        let err = generator
            .try_generate(" ", "DOC", "name", &fetcher)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = generator
            .try_generate("PRODUCTS", "", "name", &fetcher)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn column_with_query_syntax_is_rejected_before_fetching() {
        let fetcher = ScriptedFetcher::rows(&[json!({ "name": "x" })]);

        let err = generate_column("DOC:name as n FROM secrets --", "name[=:x]", &fetcher)
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.message.contains("plain identifier"));
        assert_eq!(fetcher.calls(), 0);

        let sql = generate_column("DOC_V2", "name[=:x]", &fetcher).unwrap();
        assert!(sql.contains("DOC_V2:name = 'x'"));
    }

    #[test]
    fn logic_keyword_values_compile() {
        let fetcher = ScriptedFetcher::rows(&[json!({ "state": "WA" })]);

        let sql = generate_column("DOC", "state[=:OR]", &fetcher).unwrap();

        assert_eq!(
            sql,
            "SELECT DOC:state as state\nFROM \"PRODUCTS\"\nWHERE DOC:state = 'OR';"
        );
    }

    #[test]
    fn fetch_failures_surface_after_retries() {
        let fetcher = ScriptedFetcher::failing(10, &catalog());

        let err = generate_local("name", &fetcher).unwrap_err();

        assert_eq!(err.kind, ErrorKind::DataFetch);
        assert_eq!(fetcher.calls(), 3);
    }

    #[test]
    fn empty_samples_are_no_data() {
        let err = generate_local("name", &ScriptedFetcher::rows(&[])).unwrap_err();

        assert_eq!(err.kind, ErrorKind::NoData);
    }

    #[test]
    fn schema_is_reused_across_calls() {
        let fetcher = ScriptedFetcher::rows(&catalog());
        let cache = SchemaCache::new();
        let generator = Generator::with_cache(&cache, GeneratorConfig::default());

        generator.try_generate("PRODUCTS", "DOC", "name", &fetcher).unwrap();
        generator.try_generate("PRODUCTS", "DOC", "height", &fetcher).unwrap();
        generator.describe("PRODUCTS", "DOC", &fetcher).unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().hits, 2);
    }

    ///
    /// RecordingSink
    ///

    #[derive(Default)]
    struct RecordingSink {
        events: RefCell<Vec<MetricsEvent>>,
    }

    impl MetricsSink for RecordingSink {
        fn record(&self, event: MetricsEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[test]
    fn metrics_trace_one_successful_call() {
        let sink = Rc::new(RecordingSink::default());
        let fetcher = ScriptedFetcher::rows(&catalog());

        with_metrics_sink(sink.clone(), || {
            generate_local("items.price[>:1]", &fetcher).unwrap();
        });

        let events = sink.events.borrow();
        assert_eq!(events.first(), Some(&MetricsEvent::GenerateStart));
        assert!(events.contains(&MetricsEvent::CacheMiss));
        assert!(events.contains(&MetricsEvent::FetchAttempt));
        assert!(events.contains(&MetricsEvent::DocumentsSampled { count: 2 }));
        assert!(events.contains(&MetricsEvent::Compiled {
            flattens: 2,
            ambiguous_fields: 0
        }));
        assert!(matches!(
            events.last(),
            Some(MetricsEvent::GenerateFinish { ok: true, .. })
        ));
    }

    #[test]
    fn metrics_count_failures_by_kind() {
        let sink = Rc::new(RecordingSink::default());
        let fetcher = ScriptedFetcher::rows(&catalog());

        with_metrics_sink(sink.clone(), || {
            let _ = generate_local("colour", &fetcher);
        });

        let events = sink.events.borrow();
        assert!(events.contains(&MetricsEvent::GenerateFailed {
            kind: "FieldNotFound"
        }));
        assert!(matches!(
            events.last(),
            Some(MetricsEvent::GenerateFinish { ok: false, .. })
        ));
    }
}
