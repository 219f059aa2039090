use chrono::NaiveDate;
use payables_engine::{
    aggregate, AggregationSpec, Amount, BalanceResolver, Cell, FilterConfig, FilterPipeline,
    GroupingConfig, InvoiceRecord, Reducer, SupplierBalanceRecord, Table,
};
use proptest::prelude::*;
use std::collections::HashSet;

const GL_TEXTS: [&str; 3] = ["Rent", "IOU manager", " Short Term loan "];
const METHODS: [&str; 3] = ["T", "C", ""];
const CURRENCIES: [&str; 3] = ["NGN", "USD", "ngn"];
const BLOCKS: [Option<&str>; 4] = [None, Some("A"), Some("Z"), Some("V")];
const VENDORS: [Option<&str>; 3] = [None, Some("X"), Some("Local NTC- Vendor")];
const SUPPLIERS: [Option<&str>; 4] = [None, Some("S1"), Some("S2"), Some("S3")];
const BANKS: [Option<&str>; 4] = [None, Some("1234"), Some("nan"), Some("None")];
const STATUSES: [&str; 3] = ["Due", "Not due", " due "];

fn pick<T: Copy>(options: &[T], index: usize) -> T {
    options[index % options.len()]
}

fn record(choice: &[usize; 9], position: usize) -> InvoiceRecord {
    let owned = |value: Option<&str>| value.map(str::to_string);
    InvoiceRecord {
        gl_long_text: pick(&GL_TEXTS, choice[0]).to_string(),
        payment_method: pick(&METHODS, choice[1]).to_string(),
        currency: pick(&CURRENCIES, choice[2]).to_string(),
        payment_block_code: owned(pick(&BLOCKS, choice[3])),
        vendor_category_text: owned(pick(&VENDORS, choice[4])),
        supplier_id: owned(pick(&SUPPLIERS, choice[5])),
        bank_account: owned(pick(&BANKS, choice[6])),
        due_status: pick(&STATUSES, choice[7]).to_string(),
        has_net_due_date: choice[8] % 4 != 0,
        net_due_date: (choice[8] % 2 == 1).then(|| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        cells: vec![Cell::from(position.to_string().as_str())],
    }
}

fn filters(toggles: [bool; 7]) -> FilterConfig {
    let defaults = FilterConfig::default();
    FilterConfig {
        exclude_gl_texts: if toggles[0] { defaults.exclude_gl_texts } else { Vec::new() },
        payment_method: toggles[1].then(|| "T".to_string()),
        currency: toggles[2].then(|| "NGN".to_string()),
        exclude_suppliers_with_balance: toggles[3],
        exclude_payment_block: toggles[4],
        exclude_ntc_vendor: toggles[5],
        exclude_blank_suppliers: toggles[6],
        exclude_blank_bank_accounts: !toggles[6],
    }
}

fn balance_lines(lines: &[(usize, i64, i64)]) -> Vec<SupplierBalanceRecord> {
    lines
        .iter()
        .map(|&(supplier, debit, credit)| {
            SupplierBalanceRecord::new(
                pick(&["S1", "S2", "S3", " S1 ", ""], supplier),
                Amount::from(debit),
                Amount::from(credit),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn filtering_keeps_an_ordered_subset_of_accepted_records(
        choices in prop::collection::vec(prop::array::uniform9(0usize..12), 0..=40),
        toggles in prop::array::uniform7(any::<bool>()),
        excluded in prop::collection::hash_set(prop::sample::select(vec!["S1", "S2", "S3"]), 0..=3),
    ) {
        let filters = filters(toggles);
        let pipeline = FilterPipeline::new(&filters);
        let exclusions: HashSet<String> = excluded.into_iter().map(str::to_string).collect();

        let records: Vec<InvoiceRecord> = choices
            .iter()
            .enumerate()
            .map(|(i, choice)| record(choice, i))
            .collect();
        let expected: Vec<InvoiceRecord> = records
            .iter()
            .filter(|r| pipeline.accepts(r, &exclusions))
            .cloned()
            .collect();

        let kept = pipeline.apply(records.clone(), &exclusions);

        prop_assert!(kept.len() <= records.len());
        prop_assert_eq!(&kept, &expected);
        for r in &kept {
            prop_assert!(r.has_net_due_date);
            prop_assert_eq!(r.due_status.trim().to_lowercase(), "due");
        }
    }

    #[test]
    fn resolver_ignores_line_order(
        lines in prop::collection::vec((0usize..5, -100i64..=100, -100i64..=100), 0..=20),
        rotation in 0usize..20,
    ) {
        let forward = balance_lines(&lines);
        let mut reordered = forward.clone();
        reordered.reverse();
        if !reordered.is_empty() {
            let by = rotation % reordered.len();
            reordered.rotate_left(by);
        }

        prop_assert_eq!(
            BalanceResolver::resolve(&forward).unwrap(),
            BalanceResolver::resolve(&reordered).unwrap()
        );
    }

    #[test]
    fn resolver_ignores_line_splitting(
        lines in prop::collection::vec((0usize..5, -100i64..=100, -100i64..=100), 0..=20),
        split in -50i64..=50,
    ) {
        let whole = balance_lines(&lines);
        let split_lines: Vec<(usize, i64, i64)> = lines
            .iter()
            .flat_map(|&(supplier, debit, credit)| {
                [(supplier, split, 0), (supplier, debit - split, credit)]
            })
            .collect();

        prop_assert_eq!(
            BalanceResolver::resolve(&whole).unwrap(),
            BalanceResolver::resolve(&balance_lines(&split_lines)).unwrap()
        );
    }

    #[test]
    fn summary_has_one_row_per_present_key(
        rows in prop::collection::vec((0usize..4, 0usize..3, -1000i64..=1000), 0..=30),
    ) {
        let suppliers = ["S1", "S2", "S3", ""];
        let names = ["Acme", "Bee", ""];
        let mut table = Table::new(["Supplier", "Name", "Amount"]);
        for &(supplier, name, amount) in &rows {
            table.push_row(vec![
                Cell::from(pick(&suppliers, supplier)),
                Cell::from(pick(&names, name)),
                Cell::Number(Amount::from(amount)),
            ]);
        }
        let grouping = GroupingConfig {
            by: vec!["Supplier".into()],
            aggregations: vec![
                AggregationSpec::new("Name", Reducer::First),
                AggregationSpec::new("Amount", Reducer::Sum),
            ],
        };

        let summary = aggregate(&table, &grouping).unwrap();

        let keys: Vec<&Cell> = summary.rows().iter().map(|row| &row[0]).collect();
        let unique: HashSet<&Cell> = keys.iter().copied().collect();
        prop_assert_eq!(keys.len(), unique.len());
        prop_assert!(keys.iter().all(|key| !key.is_empty()));

        let present: HashSet<&str> = rows
            .iter()
            .map(|&(supplier, _, _)| pick(&suppliers, supplier))
            .filter(|s| !s.is_empty())
            .collect();
        prop_assert_eq!(summary.len(), present.len());

        let total = summary
            .rows()
            .iter()
            .try_fold(Amount::ZERO, |acc, row| acc.checked_add(row[2].to_amount()))
            .unwrap();
        let expected: i64 = rows
            .iter()
            .filter(|&&(supplier, _, _)| !pick(&suppliers, supplier).is_empty())
            .map(|&(_, _, amount)| amount)
            .sum();
        prop_assert_eq!(total, Amount::from(expected));
    }
}
