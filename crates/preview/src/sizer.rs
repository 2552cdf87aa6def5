use crate::types::SurfaceMetrics;

/// Backing-store slack, in physical pixels, below which a mismatch between
/// the surface and its ideal size is ignored. Filters out sub-pixel rounding
/// churn from fractional scale factors without letting real resizes slip by.
const RESIZE_TOLERANCE: f64 = 4.0;

/// Outcome of comparing the current backing store against the surface's
/// ideal dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAction {
    /// Backing store is within tolerance; render targets stay untouched.
    Keep,
    /// Backing store drifted; recreate swapchain and render targets at the
    /// given size.
    Resize { width: u32, height: u32 },
}

/// Decides whether the backing store still matches the surface.
///
/// The ideal backing size is the logical extent scaled by the display's scale
/// factor; the current backing size is compared against it per axis with a
/// [`RESIZE_TOLERANCE`] pixel band. When either axis drifts past the band the
/// surface is resized to the rounded logical dimensions, clamped to at least
/// one pixel so a collapsed window never produces a zero-sized attachment.
pub fn reconcile(backing: (u32, u32), metrics: &SurfaceMetrics) -> SizeAction {
    let ideal_width = metrics.logical_width * metrics.scale_factor;
    let ideal_height = metrics.logical_height * metrics.scale_factor;

    let drift_x = (f64::from(backing.0) - ideal_width).abs();
    let drift_y = (f64::from(backing.1) - ideal_height).abs();
    if drift_x < RESIZE_TOLERANCE && drift_y < RESIZE_TOLERANCE {
        return SizeAction::Keep;
    }

    SizeAction::Resize {
        width: (metrics.logical_width.round() as u32).max(1),
        height: (metrics.logical_height.round() as u32).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(width: f64, height: f64, scale: f64) -> SurfaceMetrics {
        SurfaceMetrics {
            logical_width: width,
            logical_height: height,
            scale_factor: scale,
        }
    }

    #[test]
    fn matching_backing_is_kept() {
        let action = reconcile((800, 600), &metrics(800.0, 600.0, 1.0));
        assert_eq!(action, SizeAction::Keep);
    }

    #[test]
    fn drift_within_tolerance_is_kept() {
        // 3px off on one axis stays inside the 4px band.
        let action = reconcile((797, 600), &metrics(800.0, 600.0, 1.0));
        assert_eq!(action, SizeAction::Keep);

        let action = reconcile((803, 597), &metrics(800.0, 600.0, 1.0));
        assert_eq!(action, SizeAction::Keep);
    }

    #[test]
    fn drift_of_exactly_four_pixels_resizes() {
        let action = reconcile((804, 600), &metrics(800.0, 600.0, 1.0));
        assert_eq!(
            action,
            SizeAction::Resize {
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn drift_past_tolerance_resizes() {
        let action = reconcile((790, 600), &metrics(800.0, 600.0, 1.0));
        assert_eq!(
            action,
            SizeAction::Resize {
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn hidpi_ideal_uses_scale_factor() {
        // 400x300 logical at 2x wants an 800x600 backing store.
        let action = reconcile((800, 600), &metrics(400.0, 300.0, 2.0));
        assert_eq!(action, SizeAction::Keep);

        // A 1x-sized backing store on the same surface is way off.
        let action = reconcile((400, 300), &metrics(400.0, 300.0, 2.0));
        assert_eq!(
            action,
            SizeAction::Resize {
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn fractional_scale_rounding_noise_is_ignored() {
        // 640 logical at 1.25 wants 800.0; a backing store of 801 is noise.
        let action = reconcile((801, 481), &metrics(640.0, 384.0, 1.25));
        assert_eq!(action, SizeAction::Keep);
    }

    #[test]
    fn collapsed_surface_clamps_to_one_pixel() {
        let action = reconcile((800, 600), &metrics(0.2, 0.2, 1.0));
        assert_eq!(
            action,
            SizeAction::Resize {
                width: 1,
                height: 1
            }
        );
    }
}
