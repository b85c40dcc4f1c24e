//! Typed wrappers over well-known bundles.

use crate::entity::Entity;

/// View over a blog post node, exposing its lead-image field.
#[derive(Debug, Clone, Copy)]
pub struct BlogPost<'a> {
    entity: &'a Entity,
}

impl<'a> BlogPost<'a> {
    pub const BUNDLE: &'static str = "blog_post";

    /// Wrap an entity when it actually is a blog post node.
    pub fn wrap(entity: &'a Entity) -> Option<Self> {
        (entity.key.entity_type == "node" && entity.bundle == Self::BUNDLE)
            .then_some(Self { entity })
    }

    pub fn image_field_name(&self) -> &'static str {
        "field_blog_media_main_image"
    }

    pub fn lead_image(&self) -> Option<&'a str> {
        self.entity.text(self.image_field_name())
    }
}
