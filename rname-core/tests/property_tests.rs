use proptest::prelude::*;
use rname_core::batch::index_width;
use rname_core::operation::path_key;
use rname_core::{Batch, Config, FileContextProvider, RenameOptions, TemplateEngine};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

fn plan(stems: &HashSet<String>, template: &str) -> Batch {
    plan_with(stems, template, RenameOptions::default())
}

fn plan_with(stems: &HashSet<String>, template: &str, options: RenameOptions) -> Batch {
    let working_dir = PathBuf::from("/nonexistent/rname-props");
    let inputs = stems
        .iter()
        .map(|s| working_dir.join(format!("{}.txt", s)))
        .collect();
    let mut batch = Batch::new(
        inputs,
        template,
        options,
        &working_dir,
        Vec::new(),
    );
    let provider = FileContextProvider::new(&Config::default(), batch.options()).unwrap();
    batch.plan(&provider, &TemplateEngine::new()).unwrap();
    batch
}

proptest! {
    #[test]
    fn index_width_matches_decimal_digits(n in 1usize..100_000) {
        let width = u32::try_from(index_width(n)).unwrap();
        prop_assert!(10usize.pow(width - 1) <= n);
        prop_assert!(n < 10usize.pow(width));
    }

    #[test]
    fn indexed_outputs_are_unique(
        stems in prop::collection::hash_set("[a-zA-Z0-9]{1,6}", 1..24),
        template in prop::sample::select(vec!["same", "{{i}}-x", "x{{i}}", "{{f[:1]}}", "{{f[:2]}}", "{{f|little}}"]),
    ) {
        let batch = plan(&stems, template);

        let keys: HashSet<String> = batch
            .operations()
            .iter()
            .map(|op| path_key(op.output()))
            .collect();
        prop_assert_eq!(keys.len(), batch.operations().len());
        prop_assert!(batch.operations().iter().all(|op| !op.conflict()));
    }

    #[test]
    fn names_recreated_by_indexing_are_unique(
        stems in prop::collection::hash_set("[x1]{1,7}", 1..40),
    ) {
        // `x` and `xx` share `a`, whose index `1` recreates the literal `a1` of `1`
        let batch = plan(&stems, "a{{f|replace('x', '')}}");

        let keys: HashSet<String> = batch
            .operations()
            .iter()
            .map(|op| path_key(op.output()))
            .collect();
        prop_assert_eq!(keys.len(), batch.operations().len());
        prop_assert!(batch.operations().iter().all(|op| !op.conflict()));
    }

    #[test]
    fn shared_outputs_are_flagged_without_indexing(
        stems in prop::collection::hash_set("[a-zA-Z]{1,6}", 1..24),
        template in prop::sample::select(vec!["same", "{{f[:1]}}", "{{f|little}}"]),
    ) {
        let options = RenameOptions {
            no_index: true,
            ..RenameOptions::default()
        };
        let batch = plan_with(&stems, template, options);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for op in batch.operations() {
            *counts.entry(path_key(op.output())).or_default() += 1;
        }
        for op in batch.operations() {
            let shared = counts[&path_key(op.output())] > 1;
            prop_assert_eq!(op.conflict(), shared, "{}", op.output().display());
        }
    }

    #[test]
    fn one_shared_name_is_numbered_with_fixed_width(
        stems in prop::collection::hash_set("[a-z]{1,6}", 2..120),
    ) {
        let batch = plan(&stems, "same");
        let width = index_width(stems.len());

        let names: HashSet<String> = batch
            .operations()
            .iter()
            .map(|op| op.output().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let expected: HashSet<String> = (1..=stems.len())
            .map(|i| format!("same{:0width$}.txt", i, width = width))
            .collect();
        prop_assert_eq!(names, expected);
        prop_assert!(batch.operations().iter().all(|op| !op.conflict()));
    }
}
