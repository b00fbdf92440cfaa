//! Crate `bienal_core`: el modelo de entidades del catálogo (esculturas, artistas,
//! eventos e imágenes) tal como lo ven las capas superiores.

pub mod collection;

pub use collection::{
    account::Account,
    artist::{Artist, NationalId},
    confirmation::Confirmation,
    event::{Event, EventKey},
    image::Image,
    rating::{AvgRating, Rating, RatingError},
    sculpture::Sculpture,
};
