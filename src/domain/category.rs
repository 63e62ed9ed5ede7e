//! Category taxonomy shared by every integration source.
//!
//! Each label carries the comma-separated keyword set the ingestion pipeline
//! matches against; `/` inside a keyword stands for a space. Crawlers only
//! pick labels, they never match keywords themselves.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

macro_rules! taxonomy {
    ($($variant:ident => $keywords:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Category {
            $($variant,)*
        }

        impl Category {
            /// Every label, in table order
            pub const ALL: &'static [Category] = &[$(Category::$variant,)*];

            pub fn label(&self) -> &'static str {
                match self {
                    $(Category::$variant => stringify!($variant),)*
                }
            }

            /// The raw keyword string, which is also the wire value
            pub fn keyword_list(&self) -> &'static str {
                match self {
                    $(Category::$variant => $keywords,)*
                }
            }
        }
    };
}

taxonomy! {
    Art => "art, poesie",
    Peinture => "peinture, painting, toile, paint",
    Streetart => "streetart, street/art, graffiti/mural",
    Photo => "photo",
    Sculpture => "sculpture",
    Fashion => "fashion",
    Atelier => "atelier, workshop, cours/de",
    AtelierArtisanal => "atelier/artisanal, atelier/bijoux, atelier/couture, atelier/textile, atelier/cosmetique, atelier/parfum, moulage, céramique, gravure, broderie, craft",
    AtelierGourmand => "atelier/gourmand, atelier/degustation, atelier/gastronomie, atelier/culinaire",
    AtelierNature => "atelier/nature, atlier/terrarium, atelier/vegetal",
    AtelierArtistique => "atelier/artistique, atelier/danse, atelier/art",
    AtelierZen => "atelier/zen, zen, spirituality, yoga, meditation",
    Brocante => "brocante, vide/grenier",
    Cinema => "cinema, movie, film",
    Projection => "projection",
    Meeting => "meeting, rencontre, community, cafe/theatre",
    Soiree => "soiree, party, fete",
    Clubbing => "clubbing",
    Conference => "conference, talk, debat",
    Enfants => "enfants, child, children, kids, enfance",
    Expo => "expo, exposition, fondation, vernissage, exhibition",
    Festival => "festival",
    Gastronomie => "gastronomie, gourmand, vin, wine, food, drink, cuisine, cocktails, degustation, Œnologie",
    Livres => "livres, book, litterature, bd, bande/dessinee, romans",
    Loisirs => "loisirs, hobbies, scavenger hunt, jeu, bowling, parc attraction",
    Escapegame => "escapegame, escape/game, escape/room",
    Gaming => "gaming, game",
    Musique => "musique, music, concert, dj, gigs, candlelight, musicale, musical, fanfare",
    Rock => "rock",
    Metal => "metal",
    // classique also catches some dance shows
    Classique => "classique, classical, concerto, orchestre, opera",
    HipHop => "hiphop, hip/hop",
    Electro => "electro, electronic, electronica",
    House => "house",
    Jazz => "jazz",
    Techno => "techno",
    Rap => "rap",
    Disco => "disco",
    Pop => "pop",
    Chanson => "chanson",
    Nature => "nature, garden, plante, fleur, travel, outdoor, parc",
    Balade => "balade",
    Pro => "pro, professionnel, business, career, marketing, investment, politics, formation, manager, metier, entrepreneur, entrepreneurial, reseautage",
    Salon => "salon, forum",
    Sciences => "sciences, medicine, technologie, health, medical",
    Solidarite => "solidarite, charity, benevolat",
    Ecologie => "ecologie, ecology, climat",
    Spectacle => "spectacle, performance, scene",
    Comedie => "comedie, comedy",
    StandUp => "standup, stand/up, one/man/show, cafe/theatre, humoriste, improvisation, impro, one/(wo)man/show",
    Theatre => "theatre, theater",
    Cabaret => "cabaret",
    Cirque => "cirque, circus",
    Magie => "magie, magic, magique, magicien",
    Opera => "opera",
    ComedieMusicale => "comedie/musicale",
    Ballet => "ballet, spectacle danse",
    Sport => "sport, running, fitness, handball, football, rugby",
    Course => "course",
    Visite => "visite, musee, visit, museum",
}

impl Category {
    pub fn keywords(&self) -> Vec<&'static str> {
        self.keyword_list().split(", ").collect()
    }

    /// Look a category up by label (`Festival`) or wire value (`festival`)
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.keyword_list() == name || c.label().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.keyword_list())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Category::from_name(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown category '{}'", raw)))
    }
}
