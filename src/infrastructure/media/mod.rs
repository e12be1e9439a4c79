//! Media storage for uploaded account images

mod avatar;

pub use avatar::{
    avatar_extension, avatar_path, AvatarStore, LocalAvatarStore, ALLOWED_AVATAR_EXTENSIONS,
    DEFAULT_MAX_AVATAR_BYTES,
};

#[cfg(test)]
pub use avatar::MockAvatarStore;
