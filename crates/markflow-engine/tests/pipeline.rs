use markflow_engine::builtin::{HeadingIds, HeadingIncrement, heading_ids};
use markflow_engine::plugin::{self, TransformError};
use markflow_engine::tree::{Action, any, visit_mut};
use markflow_engine::{
    ConfigurationError, Node, NodeType, Outcome, Plugin, PluginOptions, ProcessError, Processor,
    Severity, Transform, Transformed, VFile, cancel_pair,
};
use pretty_assertions::assert_eq;

/// Returns a pending result even though it has nothing to wait for.
struct Deferred;

struct DeferredTransform;

impl Plugin for Deferred {
    fn name(&self) -> &str {
        "deferred"
    }

    fn attach(&self, _options: &PluginOptions) -> anyhow::Result<Box<dyn Transform>> {
        Ok(Box::new(DeferredTransform))
    }
}

impl Transform for DeferredTransform {
    fn transform<'a>(&'a self, tree: &'a mut Node, _file: &'a mut VFile) -> Transformed<'a> {
        Transformed::pending(async move {
            tokio::task::yield_now().await;
            tree.children.push(Node::thematic_break());
            Ok(Outcome::Keep)
        })
    }
}

fn set_text(value: &'static str) -> impl Plugin + use<> {
    plugin::from_fn("set-text", move |tree, _file| {
        visit_mut(tree, any, |node, _| {
            if node.is(NodeType::Text) {
                node.value = Some(value.to_string());
            }
            Action::Continue
        });
        Ok(Outcome::Keep)
    })
}

fn append_text(suffix: &'static str) -> impl Plugin + use<> {
    plugin::from_fn("append-text", move |tree, _file| {
        visit_mut(tree, any, |node, _| {
            if let Some(value) = &mut node.value {
                value.push_str(suffix);
            }
            Action::Continue
        });
        Ok(Outcome::Keep)
    })
}

#[test]
fn title_and_body_scan_to_the_expected_tree() {
    let file = Processor::new()
        .parse("# Title\n\nBody *text*.")
        .unwrap();
    let expected = Node::root(vec![
        Node::heading(1, vec![Node::text("Title")]),
        Node::paragraph(vec![
            Node::text("Body "),
            Node::emphasis(vec![Node::text("text")]),
            Node::text("."),
        ]),
    ]);
    assert!(file.tree().unwrap().same_structure(&expected));
    assert!(file.messages().is_empty());
}

#[test]
fn appended_paragraph_reaches_the_output() {
    let append = plugin::from_fn("append-dashes", |tree, _file| {
        tree.children.push(Node::paragraph(vec![Node::text("---")]));
        Ok(Outcome::Keep)
    });
    let processor = Processor::new().use_plugin(append).unwrap().freeze().unwrap();

    let parsed = processor.parse("# T").unwrap();
    let tree = parsed.tree().unwrap().clone();
    let file = processor.run_sync(tree, parsed).unwrap();
    let tree = file.tree().unwrap();
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[1], Node::paragraph(vec![Node::text("---")]));

    // Printed as text, not as a rule
    let file = processor.process_sync("# T").unwrap();
    assert_eq!(file.text(), "# T\n\n\\---\n");
}

#[test]
fn plugins_run_in_registration_order() {
    let first = Processor::new()
        .use_plugin(set_text("a"))
        .unwrap()
        .use_plugin(append_text("b"))
        .unwrap();
    let second = Processor::new()
        .use_plugin(append_text("b"))
        .unwrap()
        .use_plugin(set_text("a"))
        .unwrap();

    assert_eq!(first.plugins(), vec!["set-text", "append-text"]);
    assert_eq!(first.process_sync("x").unwrap().text(), "ab\n");
    assert_eq!(second.process_sync("x").unwrap().text(), "a\n");

    // Same registrations, same result, every time
    for _ in 0..3 {
        assert_eq!(first.process_sync("x").unwrap().text(), "ab\n");
    }
}

#[test]
fn frozen_processor_cannot_grow() {
    let frozen = Processor::new().use_plugin(HeadingIds).unwrap().freeze().unwrap();
    assert!(frozen.is_frozen());

    let error = frozen.use_plugin(HeadingIncrement).unwrap_err();
    assert!(matches!(error, ConfigurationError::Frozen { ref plugin } if plugin == "heading-increment"));
    assert_eq!(frozen.plugins(), vec!["heading-ids"]);
}

#[test]
fn synchronous_run_refuses_pending_results() {
    let processor = Processor::new().use_plugin(Deferred).unwrap();
    let error = processor.process_sync("# T").unwrap_err();

    assert!(matches!(error, ProcessError::Synchrony { ref plugin, .. } if plugin == "deferred"));
    let file = error.into_file().unwrap();
    assert_eq!(file.text(), "# T");
    assert_eq!(file.tree().unwrap().children.len(), 1);
}

#[tokio::test]
async fn asynchronous_run_awaits_pending_results() {
    let processor = Processor::new().use_plugin(Deferred).unwrap();
    let file = processor.process("# T").await.unwrap();
    assert_eq!(file.text(), "# T\n\n---\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_share_nothing_but_the_processor() {
    let announce = plugin::from_fn("announce", |tree, file| {
        let seen = tree.text_content();
        file.info(format!("saw {seen}"), None);
        Ok(Outcome::Keep)
    });
    let processor = Processor::new()
        .use_plugin(HeadingIds)
        .unwrap()
        .use_plugin(Deferred)
        .unwrap()
        .use_plugin(announce)
        .unwrap()
        .freeze()
        .unwrap();

    let runs: Vec<_> = (0..32)
        .map(|i| {
            let processor = processor.clone();
            tokio::spawn(async move {
                let file = VFile::new(format!("# Doc {i}\n\n# Doc {i}"))
                    .with_path(format!("doc-{i}.md"));
                let file = processor.process_file(file).await?;
                Ok::<_, ProcessError>((i, file))
            })
        })
        .collect();

    for run in runs {
        let (i, file) = run.await.unwrap().unwrap();
        let tree = file.tree().unwrap();
        let ids: Vec<_> = tree
            .children
            .iter()
            .filter_map(|node| node.data.get(&heading_ids::id_key())?.as_str())
            .map(str::to_string)
            .collect();
        assert_eq!(ids, vec![format!("doc-{i}"), format!("doc-{i}-1")]);
        assert_eq!(file.text(), format!("# Doc {i}\n\n# Doc {i}\n\n---\n"));

        let reasons: Vec<_> = file.messages().iter().map(|m| m.reason.as_str()).collect();
        assert_eq!(reasons, vec![format!("saw Doc {i}Doc {i}")]);
        assert_eq!(file.path(), Some(format!("doc-{i}.md").as_str()));
    }
}

#[tokio::test]
async fn cancelling_keeps_the_last_settled_tree() {
    let (handle, signal) = cancel_pair();
    let stop = plugin::from_fn("stop", move |tree, _file| {
        tree.children.push(Node::thematic_break());
        handle.cancel();
        Ok(Outcome::Keep)
    });
    let never = plugin::from_fn("never", |tree, _file| {
        tree.children.clear();
        Ok(Outcome::Keep)
    });
    let processor = Processor::new()
        .use_plugin(stop)
        .unwrap()
        .use_plugin(never)
        .unwrap();

    let file = processor
        .process_with_cancel("# T", signal)
        .await
        .unwrap();

    assert!(file.is_cancelled());
    assert_eq!(file.text(), "# T");
    assert_eq!(file.tree().unwrap().children.len(), 2);
    let message = file.messages().last().unwrap();
    assert_eq!(message.severity, Severity::Info);
    assert_eq!(message.reason, "Processing was cancelled before never");
}

#[tokio::test]
async fn cancelling_after_the_last_plugin_skips_printing() {
    let (handle, signal) = cancel_pair();
    let stop = plugin::from_fn("stop", move |_tree, _file| {
        handle.cancel();
        Ok(Outcome::Keep)
    });
    let processor = Processor::new().use_plugin(stop).unwrap();

    let file = processor.process_with_cancel("*a*", signal).await.unwrap();
    assert!(file.is_cancelled());
    assert_eq!(file.text(), "*a*");
    assert!(file.tree().is_some());
}

#[test]
fn fatal_stops_later_plugins() {
    let fail = plugin::from_fn("fail", |tree, file| {
        let position = tree.children[0].position.clone();
        Err(TransformError::Fatal(file.fail("No headings allowed", position)))
    });
    let processor = Processor::new()
        .use_plugin(HeadingIncrement)
        .unwrap()
        .use_plugin(fail)
        .unwrap()
        .use_plugin(set_text("unreachable"))
        .unwrap();

    let error = processor.process_sync("# A\n\n### B").unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.to_string(), "No headings allowed");

    let file = error.into_file().unwrap();
    let shown: Vec<String> = file.messages().iter().map(ToString::to_string).collect();
    assert_eq!(
        shown,
        vec![
            "3:1: warning: Heading level 3 follows level 1, expected at most 2 [markflow:heading-increment]",
            "1:1: error: No headings allowed",
        ]
    );
    assert_eq!(file.tree().unwrap().text_content(), "AB");
}

#[test]
fn built_in_plugins_resolve_by_name() {
    let mut processor = Processor::new();
    for name in ["heading-ids", "heading-increment"] {
        let plugin = markflow_engine::builtin::find(name).unwrap();
        processor = processor
            .use_shared_plugin(plugin, PluginOptions::default())
            .unwrap();
    }
    let file = processor.process_sync("# A\n\n### B").unwrap();
    assert_eq!(file.text(), "# A\n\n### B\n");
    assert!(file.has_warnings());
    assert!(!file.has_errors());
}
