use grapeset::ir::io_box_csv::{from_box_csv_str, BoxField};
use proptest::prelude::*;

mod proptest_helpers;

/// An alias for `field`, with each ASCII letter's case chosen by `mask`.
fn arb_header(field: BoxField) -> impl Strategy<Value = String> {
    let aliases = field.aliases();
    (0..aliases.len(), any::<u32>()).prop_map(move |(index, mask)| {
        aliases[index]
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                if mask & (1 << (i % 32)) != 0 {
                    ch.to_ascii_uppercase()
                } else {
                    ch
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn any_alias_in_any_case_resolves(
        headers in (
            arb_header(BoxField::X),
            arb_header(BoxField::Y),
            arb_header(BoxField::Width),
            arb_header(BoxField::Height),
        ),
        values in (0u16..2000, 0u16..2000, 1u16..500, 1u16..500),
    ) {
        let (hx, hy, hw, hh) = headers;
        let (x, y, w, h) = values;
        let csv = format!("{hx},{hy},{hw},{hh},label\n{x},{y},{w},{h},grape\n");

        let rows = from_box_csv_str(&csv);
        prop_assert_eq!(rows.len(), 1, "headers: {}", csv);
        prop_assert_eq!(
            (rows[0].x, rows[0].y, rows[0].width, rows[0].height),
            (x as f64, y as f64, w as f64, h as f64)
        );
    }

    #[test]
    fn rows_missing_a_field_are_skipped(
        missing in 0usize..4,
        x in 0u16..2000,
    ) {
        let mut cells = vec![x.to_string(); 4];
        cells[missing] = String::new();
        let csv = format!("x,y,w,h\n{}\n1,2,3,4\n", cells.join(","));

        let rows = from_box_csv_str(&csv);
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0].x, 1.0);
    }
}
