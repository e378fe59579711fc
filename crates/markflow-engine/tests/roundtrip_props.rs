//! Documents generated from Markdown building blocks must scan back to the
//! same tree after printing, whichever marker choices the printer makes.

use markflow_engine::print::options::{
    BreakStyle, Bullet, Delimiter, EmphasisMarker, Fence, FormatOptions, Rule,
};
use markflow_engine::scan::scan;
use markflow_engine::{MarkdownPrinter, Printer};
use proptest::prelude::*;

fn alternative() -> FormatOptions {
    FormatOptions {
        bullet: Bullet::Star,
        bullet_other: Bullet::Plus,
        ordered_delimiter: Delimiter::Paren,
        emphasis: EmphasisMarker::Underscore,
        strong: EmphasisMarker::Underscore,
        fence: Fence::Tilde,
        rule: Rule::Star,
        break_style: BreakStyle::Spaces,
        increment_list_marker: false,
    }
}

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn inline_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => word_strategy(),
        1 => word_strategy().prop_map(|w| format!("*{w}*")),
        1 => word_strategy().prop_map(|w| format!("**{w}**")),
        1 => word_strategy().prop_map(|w| format!("_{w}_")),
        1 => word_strategy().prop_map(|w| format!("`{w}`")),
        1 => word_strategy().prop_map(|w| format!("[{w}](https://{w}.example)")),
        1 => (word_strategy(), word_strategy()).prop_map(|(a, b)| format!("{a}_{b}")),
        1 => Just(r"\*".to_string()),
        1 => Just("#".to_string()),
        // Hard break
        1 => Just("\\\n".to_string()),
    ]
}

fn line_strategy() -> impl Strategy<Value = String> {
    let prefix = prop_oneof![
        3 => Just(""),
        1 => Just("# "),
        1 => Just("### "),
        1 => Just("- "),
        1 => Just("* "),
        1 => Just("+ "),
        1 => Just("  - "),
        1 => Just("1. "),
        1 => Just("3) "),
        1 => Just("> "),
        1 => Just("> > "),
        1 => Just("> - "),
    ];
    (prefix, word_strategy(), prop::collection::vec(inline_strategy(), 0..6)).prop_map(
        |(prefix, first, rest)| {
            let mut line = format!("{prefix}{first}");
            for atom in rest {
                line.push(' ');
                line.push_str(&atom);
            }
            line
        },
    )
}

fn block_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => line_strategy(),
        1 => word_strategy().prop_map(|w| format!("```{w}\n{w}\n```")),
        1 => word_strategy().prop_map(|w| format!("~~~ ~{w}\n{w}\n~~~")),
        1 => Just("```~~~\"\n```".to_string()),
        1 => Just("---".to_string()),
        1 => Just("* * *".to_string()),
        1 => Just("* - *".to_string()),
        1 => Just("- * -".to_string()),
        1 => Just("-".to_string()),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((block_strategy(), prop::bool::ANY), 1..8).prop_map(|blocks| {
        let mut document = String::new();
        for (block, blank_after) in blocks {
            document.push_str(&block);
            document.push_str(if blank_after { "\n\n" } else { "\n" });
        }
        document
    })
}

fn assert_round_trip(document: &str, options: FormatOptions) -> Result<(), TestCaseError> {
    let tree = scan(document);
    let printed = MarkdownPrinter::new(options.clone()).print(&tree);
    let reparsed = scan(&printed);
    prop_assert!(
        reparsed.same_structure(&tree),
        "options {:?}\nsource:\n{}\nprinted:\n{}",
        options,
        document,
        printed
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn printed_documents_scan_back(document in document_strategy()) {
        assert_round_trip(&document, FormatOptions::default())?;
        assert_round_trip(&document, alternative())?;
    }
}
