//! Agrupado de filas desnormalizadas en entidades compuestas.
//!
//! Las consultas de esculturas devuelven una fila por cada combinación
//! escultura × artista × imagen. Este módulo las colapsa en una escultura por
//! nombre, cada una con sus artistas e imágenes sin repetir, respetando el orden
//! en que aparecieron por primera vez.

use std::{collections::HashMap, hash::Hash};

/// Colección que conserva el orden de llegada y descarta duplicados por clave.
#[derive(Debug, Clone)]
pub struct Distinct<K, T> {
    positions: HashMap<K, usize>,
    items: Vec<T>,
}

impl<K, T> Default for Distinct<K, T> {
    fn default() -> Self {
        Distinct {
            positions: HashMap::new(),
            items: Vec::new(),
        }
    }
}

impl<K: Eq + Hash, T> Distinct<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devuelve el elemento con esa clave; si no existe, lo construye con `build`
    /// y lo agrega al final.
    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> T) -> &mut T {
        let index = match self.positions.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.items.len();
                self.items.push(build());
                self.positions.insert(key, index);
                index
            }
        };
        &mut self.items[index]
    }

    /// Agrega el elemento si la clave es nueva. Devuelve si se agregó.
    pub fn insert_with(&mut self, key: K, build: impl FnOnce() -> T) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.items.len());
        self.items.push(build());
        true
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Una entidad que se arma a partir de varias filas que comparten la misma clave.
pub trait Aggregate<R>: Sized {
    type Key: Eq + Hash;
    type Output;

    /// Clave de la entidad de primer nivel para esta fila.
    fn key(row: &R) -> Self::Key;

    /// Construye la entidad con la primera fila que trae su clave.
    fn start(row: &R) -> Self;

    /// Incorpora lo que la fila aporta a las colecciones anidadas.
    fn absorb(&mut self, row: &R);

    fn finish(self) -> Self::Output;
}

/// Recorre las filas en el orden recibido y devuelve una entidad por clave, en
/// orden de primera aparición.
pub fn aggregate<A, R>(rows: impl IntoIterator<Item = R>) -> Vec<A::Output>
where
    A: Aggregate<R>,
{
    let mut drafts: Distinct<A::Key, A> = Distinct::new();

    for row in rows {
        drafts.get_or_insert_with(A::key(&row), || A::start(&row)).absorb(&row);
    }

    drafts.into_vec().into_iter().map(A::finish).collect()
}

/// Variante plana: extrae de cada fila a lo sumo una entidad y descarta las de
/// clave repetida. Las filas sin entidad (`None`) se saltean.
pub fn distinct_by<R, K, T>(
    rows: &[R],
    key: impl Fn(&R) -> Option<K>,
    build: impl Fn(&R) -> T,
) -> Vec<T>
where
    K: Eq + Hash,
{
    let mut out = Distinct::new();
    for row in rows {
        if let Some(k) = key(row) {
            out.insert_with(k, || build(row));
        }
    }
    out.into_vec()
}
