//! Property tests for segmentation and resize.

use proptest::prelude::*;

use super::*;

fn assert_partition(ctx: &ConversionContext, text: &str) -> Result<(), TestCaseError> {
    let mut at = 0;
    for seg in ctx.segments() {
        prop_assert_eq!(seg.from, at);
        prop_assert!(seg.len > 0);
        prop_assert!(!seg.candidates.is_empty());
        at += seg.len;
    }
    prop_assert_eq!(at, text.chars().count());
    Ok(())
}

proptest! {
    #[test]
    fn resize_keeps_earlier_segments(
        text in "[きょうはてんきのやまかわにさんじゅうたなばた]{2,10}",
        nth in 0usize..4,
        delta in -3isize..4,
    ) {
        let mut ctx = make_test_context();
        ctx.set_string(&text);
        assert_partition(&ctx, &text)?;

        let before = ctx.segments().to_vec();
        let resized = ctx.resize_segment(nth, delta);
        assert_partition(&ctx, &text)?;
        if !resized {
            prop_assert_eq!(ctx.segments(), before.as_slice());
            return Ok(());
        }
        prop_assert_eq!(&ctx.segments()[..nth], &before[..nth]);
        let old = &before[nth];
        let new = &ctx.segments()[nth];
        prop_assert_eq!(new.from, old.from);
        prop_assert_eq!(new.len as isize, old.len as isize + delta);
    }

    #[test]
    fn conversion_is_repeatable(text in "[きょうはてんきのやまかわにはし]{1,8}") {
        let mut ctx = make_test_context();
        ctx.set_string(&text);
        let first = ctx.segments().to_vec();
        ctx.set_string(&text);
        prop_assert_eq!(ctx.segments(), first.as_slice());
    }
}
