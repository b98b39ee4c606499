#![forbid(unsafe_code)]

//! Span instrumentation of `compute_frame`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nebula_core::Config;
use nebula_render::PackedArgb;
use nebula_runtime::{ExecutionMode, FrameScheduler};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ═════════════════════════════════════════════════════════════════════════
// Capture layer
// ═════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

type SpanLog = Arc<Mutex<Vec<(tracing::span::Id, CapturedSpan)>>>;

/// Records span fields at creation and on every later `record`.
struct SpanCapture {
    spans: SpanLog,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let span = CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        };
        self.spans.lock().unwrap().push((id.clone(), span));
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);
        let mut spans = self.spans.lock().unwrap();
        if let Some((_, span)) = spans.iter_mut().rev().find(|(sid, _)| sid == id) {
            span.fields.extend(visitor.0);
        }
    }
}

fn frame_spans(config: &Config) -> (Vec<CapturedSpan>, usize) {
    let spans: SpanLog = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(SpanCapture {
        spans: Arc::clone(&spans),
    });
    let source = |x: u32, y: u32, _t: f32| PackedArgb::rgb(x as u8, y as u8, 0);
    let mut sched =
        FrameScheduler::new(source, config, ExecutionMode::Sequential).expect("scheduler");
    tracing::subscriber::with_default(subscriber, || {
        sched.compute_frame(0.5);
    });
    let tiles = sched.stats().tiles;
    let captured = spans
        .lock()
        .unwrap()
        .iter()
        .map(|(_, span)| span.clone())
        .filter(|span| span.name == "compute_frame")
        .collect();
    (captured, tiles)
}

// ═════════════════════════════════════════════════════════════════════════
// Tests
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn full_res_span_carries_path_and_tile_count() {
    let config = Config {
        width: 32,
        height: 24,
        chunk: 8,
        ..Config::default()
    };
    let (spans, tiles) = frame_spans(&config);
    assert_eq!(tiles, 12);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].fields.get("path").map(String::as_str), Some("full"));
    assert_eq!(spans[0].fields.get("tiles"), Some(&tiles.to_string()));
}

#[test]
fn low_res_span_carries_path_and_tile_count() {
    let config = Config {
        width: 64,
        height: 48,
        chunk: 8,
        render_scale: 0.5,
        ..Config::default()
    };
    let (spans, tiles) = frame_spans(&config);
    assert!(tiles > 0);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].fields.get("path").map(String::as_str), Some("lowres"));
    assert_eq!(spans[0].fields.get("tiles"), Some(&tiles.to_string()));
}
