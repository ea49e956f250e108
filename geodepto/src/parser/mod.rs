//! Lecture des fichiers du shapefile depuis des tampons en mémoire
//!
//! Les géométries passent par `shapefile`, les attributs par `dbase`.

pub mod dbf;
pub mod shp;
