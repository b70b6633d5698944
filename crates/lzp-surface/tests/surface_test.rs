use approx::assert_abs_diff_eq;
use lzp_core::{CancelToken, Shape, Volume};
use lzp_surface::{
    ExtractSurfaceParameters, FusedProjector, ProjectionMethod, ReferenceSurface, ReferenceSurfaceParameters,
    SurfaceMethod, SurfaceProjector, SyntheticFocus, extract_streaming,
};

fn variance_params(method: SurfaceMethod) -> ReferenceSurfaceParameters {
    ReferenceSurfaceParameters::builder()
        .method(method)
        .filter_window_size(5)
        .z_min(0)
        .z_max(19)
        .build()
        .expect("valid parameters")
}

#[test]
fn flat_surface_end_to_end() {
    let stack = SyntheticFocus::default().render(Shape::stack(64, 64, 20));
    let hm = ReferenceSurface::new(variance_params(SurfaceMethod::MaxOfVariance))
        .estimate(&stack)
        .expect("estimate");
    assert!(hm.data().iter().all(|&z| z == 10));

    let out = SurfaceProjector::new(ExtractSurfaceParameters::default())
        .project(&stack, &hm)
        .expect("project");
    assert_eq!(out.data(), stack.plane(0, 10, 0).expect("plane 10"));
}

#[test]
fn flat_surface_sparse_grid() {
    let stack = SyntheticFocus::default().render(Shape::stack(64, 64, 20));
    let hm = ReferenceSurface::new(variance_params(SurfaceMethod::SparseMaxOfVariance))
        .estimate(&stack)
        .expect("estimate");
    assert_eq!(hm.min_max(), Some((10, 10)));
}

#[test]
fn tilted_surface_is_tracked() {
    let synth = SyntheticFocus {
        focus_z: 4.0,
        tilt_x: 0.125,
        ..SyntheticFocus::default()
    };
    let stack = synth.render(Shape::stack(64, 16, 16));
    let hm = ReferenceSurface::new(variance_params(SurfaceMethod::MaxOfVariance))
        .estimate(&stack)
        .expect("estimate");
    for y in 0..16 {
        for x in 0..64 {
            let z = hm.get(x, y).expect("in bounds") as f64;
            assert_abs_diff_eq!(z, synth.focus_at(x, 0), epsilon = 1.0);
        }
    }
}

#[test]
fn binned_estimate_covers_full_plane() {
    let stack = SyntheticFocus {
        cell: 4,
        ..SyntheticFocus::default()
    }
    .render(Shape::stack(70, 50, 20));
    let params = ReferenceSurfaceParameters::builder()
        .method(SurfaceMethod::MaxOfVariance)
        .binning(2)
        .filter_window_size(12)
        .gaussian_pre_filter(0.5)
        .median_post_filter_half_size(1)
        .build()
        .expect("valid parameters");
    let hm = ReferenceSurface::new(params).estimate(&stack).expect("estimate");
    assert_eq!((hm.width(), hm.height()), (70, 50));
    assert_eq!(hm.min_max(), Some((10, 10)));
}

#[test]
fn mean_projection_on_known_window() {
    let stack = Volume::from_fn(Shape::stack(2, 2, 6), |_, _, z, _, _| (z * z) as f32);
    let hm = lzp_core::HeightMap::filled(2, 2, 3);
    let mip = ExtractSurfaceParameters::builder().delta_z(0, 2).build();
    let mean = ExtractSurfaceParameters::builder()
        .delta_z(0, 2)
        .projection_method(0, ProjectionMethod::Mean)
        .build();
    let mip = SurfaceProjector::new(mip).project(&stack, &hm).expect("mip");
    let mean = SurfaceProjector::new(mean).project(&stack, &hm).expect("mean");
    assert_eq!(mip.data(), &[25.0; 4]);
    // (1 + 4 + 9 + 16 + 25) / 5
    for &v in mean.data() {
        assert_abs_diff_eq!(v, 11.0, epsilon = 1e-6);
    }
}

#[test]
fn streaming_equals_projector_when_windows_fit() {
    let synth = SyntheticFocus {
        focus_z: 6.0,
        tilt_x: 0.1,
        ..SyntheticFocus::default()
    };
    let stack = synth.render(Shape::stack(40, 8, 16).with_channels(2));
    let target = lzp_core::ChannelOf::new::<u16>(&stack, 0).expect("channel 0");
    let hm = ReferenceSurface::new(variance_params(SurfaceMethod::MaxOfVariance))
        .estimate::<u16, _>(&target)
        .expect("estimate");
    let params = ExtractSurfaceParameters::builder()
        .delta_z(0, 2)
        .delta_z(1, 1)
        .z_offset(1, 1)
        .projection_method(1, ProjectionMethod::Mean)
        .build();
    let expected = SurfaceProjector::new(params.clone())
        .project(&stack, &hm)
        .expect("project");
    let streamed = extract_streaming(&stack, &hm, &params, &CancelToken::new()).expect("stream");
    assert_eq!(streamed, expected);
}

#[test]
fn fused_zero_delta_matches_two_pass() {
    let stack = SyntheticFocus {
        tilt_x: -0.1,
        focus_z: 12.0,
        ..SyntheticFocus::default()
    }
    .render(Shape::stack(48, 12, 18));
    let params = variance_params(SurfaceMethod::SparseMaxOfVariance);
    let hm = ReferenceSurface::new(params.clone()).estimate(&stack).expect("estimate");
    let two_pass = SurfaceProjector::new(ExtractSurfaceParameters::default())
        .project(&stack, &hm)
        .expect("project");

    let (mip, fused_hm) = FusedProjector::new(params, 0)
        .expect("no median")
        .project(&stack)
        .expect("fused");
    assert_eq!(fused_hm, hm);
    assert_eq!(mip.data(), two_pass.data());
}
