use glam::{EulerRot, Quat, Vec3};

/// Spatial state of an element: position, rotation (degrees, applied in
/// Z-Y-X order), velocity and angular velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotation as a quaternion, Z-Y-X euler order, degrees in, radians
    /// applied.
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.rotation.z.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

/// Resolve the world-space transform of an attached element.
///
/// Offsets are interpreted in the object space of the attachment target, not
/// world space: the positional offset is rotated by the target's orientation
/// before being added to the target's position. Velocity follows the target
/// so attached elements track its movement exactly.
pub fn resolve_attachment(target: &Transform, pos_offset: Vec3, rot_offset: Vec3) -> Transform {
    Transform {
        position: target.position + target.rotation_quat() * pos_offset,
        rotation: target.rotation + rot_offset,
        velocity: target.velocity,
        angular_velocity: target.angular_velocity,
    }
}
