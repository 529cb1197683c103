use proptest::prelude::*;
use std::fs;
use uzip_core::manifest::{read_manifest, write_manifest};
use uzip_core::progress::{parse_percent, render_bar, BAR_WIDTH};
use uzip_core::split_size::{is_valid, SplitSize};

proptest! {
    #[test]
    fn split_size_accepts_digits_then_unit(n in "[0-9]{1,12}", unit in "[kmgKMG]") {
        let token = format!("{n}{unit}");
        prop_assert!(is_valid(&token));
        let parsed = SplitSize::parse(&token).unwrap();
        prop_assert_eq!(parsed.as_str(), token.as_str());
    }

    #[test]
    fn split_size_rejects_everything_else(s in "\\PC{0,8}") {
        let mut chars = s.chars();
        let unit = chars.next_back();
        let shaped = matches!(unit, Some('k' | 'm' | 'g' | 'K' | 'M' | 'G'))
            && !chars.as_str().is_empty()
            && chars.as_str().bytes().all(|b| b.is_ascii_digit());
        prop_assert_eq!(is_valid(&s), shaped);
    }

    #[test]
    fn bar_is_always_twenty_cells(p in 0u8..=100) {
        let bar = render_bar(p);
        prop_assert_eq!(bar.chars().count(), BAR_WIDTH);
        let filled = bar.chars().filter(|&c| c == '█').count();
        let exact = p as f64 / 100.0 * BAR_WIDTH as f64;
        prop_assert!((filled as f64 - exact).abs() <= 0.5);
    }

    #[test]
    fn percent_roundtrips_through_text(p in 0u8..=100, prefix in "[a-z :\\-]{0,10}") {
        prop_assert_eq!(parse_percent(&format!("{prefix}{p}% rest")), Some(p));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn manifest_parts_follow_volume_numbers(count in 1usize..40, seed in any::<u64>()) {
        let dir = tempfile::tempdir().unwrap();
        let mut numbers: Vec<usize> = (1..=count).collect();
        // cheap deterministic shuffle so files are created out of order
        let mut state = seed | 1;
        for i in (1..numbers.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            numbers.swap(i, (state % (i as u64 + 1)) as usize);
        }
        for n in &numbers {
            fs::write(dir.path().join(format!("Data.7z.{n:03}")), b"v").unwrap();
        }

        let split = SplitSize::parse("10m").unwrap();
        let written = write_manifest(dir.path(), "Data", &split).unwrap();
        let expected: Vec<String> = (1..=count).map(|n| format!("Data.7z.{n:03}")).collect();
        prop_assert_eq!(&written.parts, &expected);

        let read = read_manifest(dir.path()).unwrap();
        prop_assert_eq!(&read.manifest().parts, &expected);
    }
}
