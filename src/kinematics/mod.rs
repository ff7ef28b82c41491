//!
//! Inverse kinematics of the 3RRR planar parallel platform
//!

pub mod error;

use nalgebra::Vector2;

use crate::hardware::math::{circular_distance, normalize_degrees, HALF_TURN};
use crate::hardware::{LegGeometry, RobotGeometry, LEG_COUNT};
use error::KinematicsError;

///
/// The position and orientation of the moving platform.
///
/// # Fields:
/// - `x`: The x location of the platform center, in inches
/// - `y`: The y location of the platform center, in inches
/// - `theta`: The platform orientation, in degrees
///
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlatformPose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl PlatformPose {
    pub fn new(x: f64, y: f64, theta: f64) -> PlatformPose {
        PlatformPose { x, y, theta }
    }
}

///
/// Computes both joint angles that place one leg's attachment point at the pose.
/// The two solutions are the elbow configurations of the RRR chain.
///
/// # Parameters:
/// - `index`: The leg index, only used to label errors
/// - `leg`: The leg geometry
/// - `pose`: The requested platform pose
///
/// # Returns:
/// - Both candidate joint angles, each within `[0, 360)` degrees
/// - `KinematicsError::Unreachable` if the leg cannot close the loop
///
pub fn leg_branches(index: usize, leg: &LegGeometry, pose: &PlatformPose) -> Result<[f64; 2], KinematicsError> {
    let unreachable = KinematicsError::Unreachable { leg: index, x: pose.x, y: pose.y, theta: pose.theta };

    let q: Vector2<f64> = Vector2::from(leg.base()) - leg.attachment_point(pose);
    let r = q.norm();
    let (a, b) = (leg.a(), leg.b());

    // projection of the driven arm onto q needed to close the triangle
    let projection = (b * b - a * a - q.norm_squared()) / (2. * a);
    let ratio = projection / r;

    if !(r > 0.) || !ratio.is_finite() || ratio.abs() > 1. {
        return Err(unreachable);
    }

    let omega = (q.x / r).atan2(q.y / r).to_degrees();
    let alpha = ratio.asin().to_degrees();

    Ok([
        normalize_degrees(alpha - omega),
        normalize_degrees(HALF_TURN - alpha - omega),
    ])
}

///
/// Picks the candidate closest to the previous angle, measured around the circle.
/// This keeps the leg in the same elbow configuration from one pose to the next.
/// On an exact tie the second candidate is chosen.
///
pub fn select_branch(candidates: [f64; 2], previous: f64) -> f64 {
    let [first, second] = candidates;

    if circular_distance(first, previous) < circular_distance(second, previous) {
        first
    } else {
        second
    }
}

///
/// Solves a single leg, choosing the branch continuous with its previous angle.
///
pub fn solve_leg(index: usize, leg: &LegGeometry, pose: &PlatformPose, previous: f64) -> Result<f64, KinematicsError> {
    let candidates = leg_branches(index, leg, pose)?;
    let chosen = select_branch(candidates, previous);

    tracing::trace!(leg = index, a = candidates[0], b = candidates[1], chosen, "Leg solved");
    Ok(chosen)
}

///
/// Computes all three joint angles for a platform pose. The legs are independent,
/// each only uses its own geometry and previous angle.
///
/// # Parameters:
/// - `pose`: The requested platform pose
/// - `geometry`: The robot's leg geometry
/// - `previous`: The last solved joint angles, used to pick each leg's branch
///
/// # Returns:
/// - The joint angles in leg order, each within `[0, 360)` degrees
/// - `KinematicsError::Unreachable` naming the first leg that cannot reach
///
pub fn solve(pose: &PlatformPose, geometry: &RobotGeometry, previous: &[f64; LEG_COUNT]) -> Result<[f64; LEG_COUNT], KinematicsError> {
    let mut angles = [0.; LEG_COUNT];

    for (index, leg) in geometry.legs.iter().enumerate() {
        angles[index] = solve_leg(index, leg, pose, previous[index])?;
    }

    Ok(angles)
}


///
/// The robot's kinematic state: where the platform is and what the joints should be
/// for it to be there. The joint angles double as the branch hint for the next solve.
///
/// # Fields:
/// - `geometry`: The leg geometry, fixed for the platform's life
/// - `pose`: The current platform pose
/// - `previous_pose`: The pose before the last change
/// - `angles`: The joint angles for the current pose, starting at zero
/// - `previous_angles`: The joint angles before the last solve
///
#[derive(Debug, Clone)]
pub struct Platform {
    geometry: RobotGeometry,
    pose: PlatformPose,
    previous_pose: PlatformPose,
    angles: [f64; LEG_COUNT],
    previous_angles: [f64; LEG_COUNT],
}

impl Platform {
    ///
    /// Creates a platform at pose (0, 0, 0) with every joint angle seeded at zero.
    /// The zero seed only decides which branch the very first solve prefers.
    ///
    pub fn new(geometry: RobotGeometry) -> Platform {
        Platform {
            geometry,
            pose: PlatformPose::default(),
            previous_pose: PlatformPose::default(),
            angles: [0.; LEG_COUNT],
            previous_angles: [0.; LEG_COUNT],
        }
    }

    ///
    /// Solves for a new pose and commits it. If any leg cannot reach, neither the pose
    /// nor the joint angles change.
    ///
    /// # Parameters:
    /// - `x`: The requested platform x, in inches
    /// - `y`: The requested platform y, in inches
    /// - `theta`: The requested orientation, in degrees
    ///
    /// # Returns:
    /// - The new joint angles
    /// - `KinematicsError::Unreachable` if the pose was rejected
    ///
    pub fn update_joints(&mut self, x: f64, y: f64, theta: f64) -> Result<[f64; LEG_COUNT], KinematicsError> {
        let target = PlatformPose::new(x, y, theta);

        let angles = match solve(&target, &self.geometry, &self.angles) {
            Ok(angles) => angles,
            Err(err) => {
                tracing::warn!("Rejected pose update: {}", err);
                return Err(err);
            }
        };

        self.previous_pose = self.pose;
        self.pose = target;
        self.previous_angles = self.angles;
        self.angles = angles;

        tracing::debug!(x, y, theta, ?angles, "Joints updated");
        Ok(angles)
    }

    /// Moves the platform back to (0, 0) at orientation 0, without solving.
    pub fn reset(&mut self) {
        self.previous_pose = self.pose;
        self.pose = PlatformPose::default();
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.previous_pose = self.pose;
        self.pose.x = x;
        self.pose.y = y;
    }

    pub fn set_x(&mut self, x: f64) {
        self.previous_pose = self.pose;
        self.pose.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.previous_pose = self.pose;
        self.pose.y = y;
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.previous_pose = self.pose;
        self.pose.theta = theta;
    }

    pub fn pose(&self) -> PlatformPose {
        self.pose
    }

    pub fn previous_pose(&self) -> PlatformPose {
        self.previous_pose
    }

    /// The platform center, in inches.
    pub fn position(&self) -> (f64, f64) {
        (self.pose.x, self.pose.y)
    }

    pub fn x(&self) -> f64 {
        self.pose.x
    }

    pub fn y(&self) -> f64 {
        self.pose.y
    }

    pub fn theta(&self) -> f64 {
        self.pose.theta
    }

    pub fn angles(&self) -> [f64; LEG_COUNT] {
        self.angles
    }

    ///
    /// # Returns:
    /// - The joint angle of one leg, or `None` if the index is not a leg
    ///
    pub fn angle(&self, leg: usize) -> Option<f64> {
        self.angles.get(leg).copied()
    }

    pub fn previous_angles(&self) -> [f64; LEG_COUNT] {
        self.previous_angles
    }

    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_robot() -> RobotGeometry {
        RobotGeometry::new([
            LegGeometry::new([0., 0.], 4., 4., [-1.5, -0.866]).unwrap(),
            LegGeometry::new([10., 0.], 4., 4., [1.5, -0.866]).unwrap(),
            LegGeometry::new([5., 8.66], 4., 4., [0., 1.73]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn reference_pose_single_leg() {
        let leg = small_robot().legs[0];
        let pose = PlatformPose::new(7., 5., 0.);

        let angle = solve_leg(0, &leg, &pose, 0.).unwrap();
        assert!(angle.is_finite());
        assert!((0. ..360.).contains(&angle));
        assert_abs_diff_eq!(angle, 6.252105070515654, epsilon = 1e-9);
        assert_abs_diff_eq!(leg.closure_error(&pose, angle), 0., epsilon = 1e-9);
    }

    #[test]
    fn reference_pose_all_legs() {
        let angles = solve(&PlatformPose::new(7., 5., 0.), &small_robot(), &[0.; 3]).unwrap();
        let expected = [6.252105070515654, 53.290512284022014, 25.69075618228883];

        for (angle, want) in angles.iter().zip(expected) {
            assert_abs_diff_eq!(*angle, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn both_branches_close_the_loop() {
        let geometry = small_robot();
        let pose = PlatformPose::new(5., 3., 15.);

        for (index, leg) in geometry.legs.iter().enumerate() {
            for angle in leg_branches(index, leg, &pose).unwrap() {
                assert_abs_diff_eq!(leg.closure_error(&pose, angle), 0., epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn prefers_branch_across_zero() {
        // place q straight up the y axis so the branches straddle 90 degrees at 1 and 179
        let a = 4.;
        let r = 5.;
        let b = (a * a + r * r + 2. * a * r * 1f64.to_radians().sin()).sqrt();
        let leg = LegGeometry::new([0., 0.], a, b, [0., 0.]).unwrap();
        let pose = PlatformPose::new(0., -r, 0.);

        let [first, second] = leg_branches(0, &leg, &pose).unwrap();
        assert_abs_diff_eq!(first, 1., epsilon = 1e-9);
        assert_abs_diff_eq!(second, 179., epsilon = 1e-9);

        let chosen = solve_leg(0, &leg, &pose, 359.).unwrap();
        assert_abs_diff_eq!(chosen, 1., epsilon = 1e-9);
    }

    #[test]
    fn tie_goes_to_second_branch() {
        assert_eq!(select_branch([10., 30.], 20.), 30.);
        assert_eq!(select_branch([10., 30.], 19.), 10.);
    }

    #[test]
    fn recovers_constructed_angles() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..2_000 {
            let pose = PlatformPose::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-180.0..180.0),
            );
            let base = [rng.random_range(10.0..20.0), rng.random_range(-20.0..-10.0)];
            let attachment = [rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)];
            let a = rng.random_range(1.0..10.0);
            let angle: f64 = rng.random_range(0.0..360.0);

            // forward: pick the joint angle, then size the passive arm to fit
            let scratch = LegGeometry::new(base, a, 1., attachment).unwrap();
            let b = (scratch.attachment_point(&pose) - scratch.elbow_point(angle)).norm();
            let leg = LegGeometry::new(base, a, b, attachment).unwrap();

            let solved = solve_leg(0, &leg, &pose, angle).unwrap();
            assert!(circular_distance(solved, angle) < 1e-6, "{} != {}", solved, angle);
        }
    }

    #[test]
    fn unreachable_poses_name_the_leg() {
        let geometry = small_robot();

        match solve(&PlatformPose::new(100., 100., 0.), &geometry, &[0.; 3]) {
            Err(KinematicsError::Unreachable { leg, .. }) => assert_eq!(leg, 0),
            other => panic!("expected unreachable, got {:?}", other),
        }

        // attachment sitting on leg 1's base joint
        let on_base = PlatformPose::new(10. - 1.5, 0.866, 0.);
        let err = solve_leg(1, &geometry.legs[1], &on_base, 0.).unwrap_err();
        assert_eq!(err, KinematicsError::Unreachable { leg: 1, x: on_base.x, y: on_base.y, theta: 0. });
    }

    #[test]
    fn nan_pose_is_unreachable() {
        assert!(solve(&PlatformPose::new(f64::NAN, 0., 0.), &small_robot(), &[0.; 3]).is_err());
    }

    #[test]
    fn platform_commits_on_success() {
        let mut platform = Platform::new(small_robot());
        let angles = platform.update_joints(7., 5., 0.).unwrap();

        assert_eq!(platform.angles(), angles);
        assert_eq!(platform.previous_angles(), [0.; 3]);
        assert_eq!(platform.pose(), PlatformPose::new(7., 5., 0.));
        assert_eq!(platform.previous_pose(), PlatformPose::default());
        assert_eq!(platform.angle(0), Some(angles[0]));
        assert_eq!(platform.angle(3), None);
    }

    #[test]
    fn platform_holds_state_on_failure() {
        let mut platform = Platform::new(small_robot());
        let angles = platform.update_joints(7., 5., 0.).unwrap();

        assert!(platform.update_joints(50., 50., 0.).is_err());
        assert_eq!(platform.angles(), angles);
        assert_eq!(platform.pose(), PlatformPose::new(7., 5., 0.));
    }

    #[test]
    fn small_moves_stay_on_branch() {
        let mut platform = Platform::new(RobotGeometry::default());
        let mut last = platform.update_joints(8.875, 5.124, 0.).unwrap();

        for step in 1..=50 {
            let t = step as f64 * 0.02;
            let angles = platform.update_joints(8.875 + t, 5.124 + t / 2., 0.).unwrap();
            for leg in 0..LEG_COUNT {
                assert!(circular_distance(angles[leg], last[leg]) < 5.);
            }
            last = angles;
        }
    }

    #[test]
    fn setters_record_previous_pose() {
        let mut platform = Platform::new(small_robot());
        platform.set_x(7.);
        assert_eq!(platform.x(), 7.);
        platform.set_y(5.);
        assert_eq!(platform.previous_pose(), PlatformPose::new(7., 0., 0.));
        assert_eq!(platform.position(), (7., 5.));
        platform.set_theta(30.);
        assert_eq!(platform.theta(), 30.);
        platform.set_position(1., 2.);
        assert_eq!(platform.previous_pose(), PlatformPose::new(7., 5., 30.));

        platform.reset();
        assert_eq!(platform.pose(), PlatformPose::default());
    }
}
