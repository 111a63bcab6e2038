//! JSON-lines event format used by the file sink and the JSON console.
//!
//! One object per record: `timestamp`, `level`, `message` and every event
//! field at the top level. A structured-data record carries its pairs as
//! JSON object text in the `data` field; those pairs are spread into the
//! record as individual keys. Pairs whose key is already taken by the record
//! stay nested under `data`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event field `Logger::log_structured_data` uses for its pairs.
const STRUCTURED_FIELD: &str = "data";

const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "message", STRUCTURED_FIELD];

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLines;

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let record = collector.into_record(event.metadata().level());
        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: Map<String, Value>,
    structured: Option<Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == STRUCTURED_FIELD {
            self.structured = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }

    fn into_record(self, level: &Level) -> Value {
        let mut record = Map::new();
        record.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        record.insert("level".to_string(), Value::String(level.to_string()));
        record.extend(self.fields);

        match self.structured {
            Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(pairs)) => spread(&mut record, pairs),
                _ => {
                    record.insert(STRUCTURED_FIELD.to_string(), Value::String(text));
                }
            },
            Some(other) => {
                record.insert(STRUCTURED_FIELD.to_string(), other);
            }
            None => {}
        }

        Value::Object(record)
    }
}

fn spread(record: &mut Map<String, Value>, pairs: Map<String, Value>) {
    let mut nested = Map::new();
    for (key, value) in pairs {
        if RESERVED_KEYS.contains(&key.as_str()) || record.contains_key(&key) {
            nested.insert(key, value);
        } else {
            record.insert(key, value);
        }
    }
    if !nested.is_empty() {
        record.insert(STRUCTURED_FIELD.to_string(), Value::Object(nested));
    }
}

impl Visit for FieldCollector {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}
