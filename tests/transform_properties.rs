// Pixel-level properties of the grayscale transform
use displacement_map::displacement::{
    ImageError, RgbaBuffer, luminance, transform, transform_with_threshold,
};
use proptest::prelude::*;

fn buffer_strategy() -> impl Strategy<Value = RgbaBuffer> {
    (1u32..24, 1u32..24).prop_flat_map(|(width, height)| {
        proptest::collection::vec(any::<u8>(), (width * height * 4) as usize).prop_map(
            move |data| RgbaBuffer::from_raw(width, height, data).expect("length matches dimensions"),
        )
    })
}

proptest! {
    #[test]
    fn dimensions_are_preserved(buffer in buffer_strategy()) {
        let output = transform(&buffer).expect("non-empty buffer");
        prop_assert_eq!(output.dimensions(), buffer.dimensions());
    }

    #[test]
    fn alpha_is_preserved_and_rgb_is_single_valued(buffer in buffer_strategy()) {
        let output = transform(&buffer).expect("non-empty buffer");

        for (src, dst) in buffer.as_raw().chunks_exact(4).zip(output.as_raw().chunks_exact(4)) {
            prop_assert_eq!(dst[3], src[3]);
            prop_assert_eq!(dst[0], dst[1]);
            prop_assert_eq!(dst[1], dst[2]);
            prop_assert_eq!(dst[0], luminance(src[0], src[1], src[2]));
        }
    }

    #[test]
    fn transform_is_idempotent(buffer in buffer_strategy()) {
        let once = transform(&buffer).expect("non-empty buffer");
        let twice = transform(&once).expect("non-empty buffer");
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn parallel_path_matches_sequential(buffer in buffer_strategy()) {
        let sequential = transform_with_threshold(&buffer, u64::MAX).expect("sequential");
        let parallel = transform_with_threshold(&buffer, 0).expect("parallel");
        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn luminance_matches_exact_truncation(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let exact = (299.0 * r as f64 + 587.0 * g as f64 + 114.0 * b as f64) / 1000.0;
        let gray = luminance(r, g, b) as f64;
        prop_assert!(gray <= exact && exact < gray + 1.0);
    }
}

#[test]
fn known_values() {
    let red = RgbaBuffer::from_raw(1, 1, vec![255, 0, 0, 255]).expect("red");
    assert_eq!(transform(&red).expect("red").pixel(0, 0), Some([76, 76, 76, 255]));

    let clear = RgbaBuffer::from_raw(1, 1, vec![0, 0, 0, 0]).expect("clear");
    assert_eq!(transform(&clear).expect("clear").pixel(0, 0), Some([0, 0, 0, 0]));

    let white = RgbaBuffer::filled(2, 2, [255, 255, 255, 255]).expect("white");
    assert_eq!(transform(&white).expect("white"), white);
}

#[test]
fn zero_sized_input_is_empty_input() {
    let empty = RgbaBuffer::from_raw(0, 0, Vec::new()).expect("0x0");
    assert!(matches!(transform(&empty), Err(ImageError::EmptyInput(_))));
}
