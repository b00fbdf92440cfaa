use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use bienal_core::{AvgRating, Confirmation, EventKey};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use super::*;
use crate::config::{DatabaseConfig, HashingConfig};
use crate::error::UploadError;
use crate::row::Row;
use crate::uploads::{Destination, ImagePayload};

/// Devuelve siempre las mismas filas y anota qué procedimientos se llamaron.
#[derive(Default)]
struct ScriptedSource {
    rows: Vec<Row>,
    calls: Mutex<Vec<Procedure>>,
}

#[async_trait::async_trait]
impl RowSource for ScriptedSource {
    async fn execute(&self, procedure: Procedure, params: Vec<Param>) -> Result<ResultSet> {
        procedure.check_arity(params.len())?;
        self.calls.lock().unwrap().push(procedure);
        Ok(ResultSet::from_rows(self.rows.clone()))
    }
}

/// "Hash" trivial: `hashed:<secreto>`. Cuenta las comparaciones.
#[derive(Default)]
struct CountingHasher {
    verifications: AtomicUsize,
}

#[async_trait::async_trait]
impl CredentialHasher for CountingHasher {
    async fn hash(&self, secret: &str) -> Result<String> {
        Ok(format!("hashed:{secret}"))
    }

    async fn verify(&self, secret: &str, hashed: &str) -> Result<bool> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        Ok(hashed == format!("hashed:{secret}"))
    }
}

/// Uploader en memoria: la URL se arma con la carpeta y el id público.
#[derive(Default)]
struct MemoryUploader {
    uploads: Mutex<Vec<Destination>>,
    fail: bool,
}

impl MemoryUploader {
    fn failing() -> Self {
        MemoryUploader {
            fail: true,
            ..Default::default()
        }
    }

    fn count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ImageUploader for MemoryUploader {
    async fn upload(&self, _payload: &ImagePayload, destination: &Destination) -> Result<String, UploadError> {
        self.uploads.lock().unwrap().push(destination.clone());
        if self.fail {
            return Err(UploadError::Rejected {
                status: 401,
                message: "Invalid Signature".to_string(),
            });
        }
        Ok(format!(
            "https://img.test/{}/{}",
            destination.folder, destination.public_id
        ))
    }
}

fn account_row(email: &str, hash: &str) -> Row {
    match json!({
        "email": email,
        "full_name": "Visitante",
        "role": "visitor",
        "password_hash": hash,
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn scripted(rows: Vec<Row>) -> Catalog<ScriptedSource, CountingHasher, MemoryUploader> {
    Catalog::new(
        ScriptedSource {
            rows,
            ..Default::default()
        },
        CountingHasher::default(),
        MemoryUploader::default(),
        UploadConfig::default(),
    )
}

fn photo() -> ImagePayload {
    ImagePayload::new(vec![0x89, 0x50, 0x4E, 0x47])
}

type SqliteCatalog<H> = Catalog<SqliteDatabase, H, MemoryUploader>;

fn sqlite_catalog_with<H: CredentialHasher>(hasher: H, uploader: MemoryUploader) -> (TempDir, SqliteCatalog<H>) {
    let tmp = tempdir().unwrap();
    let db = SqliteDatabase::open(&DatabaseConfig::sqlite(tmp.path().join("catalog.db"))).unwrap();
    (tmp, Catalog::new(db, hasher, uploader, UploadConfig::default()))
}

fn sqlite_catalog() -> (TempDir, SqliteCatalog<CountingHasher>) {
    sqlite_catalog_with(CountingHasher::default(), MemoryUploader::default())
}

fn new_artist(id: &str, name: &str) -> NewArtist {
    NewArtist {
        national_id: id.to_string(),
        full_name: name.to_string(),
        biography: Some("Talla en quebracho".to_string()),
        contact: Some(format!("{id}@example.com")),
        password: None,
    }
}

fn new_sculpture(name: &str) -> NewSculpture {
    NewSculpture {
        name: name.to_string(),
        created_on: Some("2024-07-14".to_string()),
        background: None,
        technique: Some("talla directa".to_string()),
    }
}

fn new_event(name: &str, location: &str) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        location: location.to_string(),
        theme: Some("Raíces".to_string()),
        starts_on: Some("2024-07-13".to_string()),
        ends_on: Some("2024-07-21".to_string()),
        starts_at: Some("10:00:00".to_string()),
        ends_at: Some("18:00:00".to_string()),
    }
}

/// Dos esculturas: "Ceibo" (artistas 1 y 2, dos fotos) y "Yaguareté" (artista 2).
async fn seed<H: CredentialHasher>(catalog: &SqliteCatalog<H>) {
    catalog.insert_artist(new_artist("1", "Ana Quiroga"), photo()).await.unwrap();
    catalog.insert_artist(new_artist("2", "Luis Benítez"), photo()).await.unwrap();

    catalog.insert_sculpture(new_sculpture("Ceibo")).await.unwrap();
    catalog.insert_sculpture(new_sculpture("Yaguareté")).await.unwrap();

    catalog.insert_made_by("1", "Ceibo").await.unwrap();
    catalog.insert_made_by("2", "Ceibo").await.unwrap();
    catalog.insert_made_by("2", "Yaguareté").await.unwrap();

    catalog.insert_image("boceto", "Ceibo", photo()).await.unwrap();
    catalog.insert_image("final", "Ceibo", photo()).await.unwrap();

    catalog.insert_event(new_event("Bienal", "Resistencia")).await.unwrap();
    catalog.insert_competes("Bienal", "Ceibo").await.unwrap();
}

#[tokio::test]
async fn login_with_unknown_email_never_compares() {
    let catalog = scripted(vec![]);

    let err = catalog.login("nadie@example.com", "x").await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "{err:?}");
    assert_eq!(catalog.hasher.verifications.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn login_with_wrong_password_compares_exactly_once() {
    let catalog = scripted(vec![account_row("v@example.com", "hashed:correcta")]);

    let err = catalog.login("v@example.com", "incorrecta").await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "{err:?}");
    assert_eq!(catalog.hasher.verifications.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_with_correct_password_returns_the_rows() {
    let catalog = scripted(vec![account_row("v@example.com", "hashed:correcta")]);

    let accounts = catalog.login("v@example.com", "correcta").await.unwrap();

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].email, "v@example.com");
    assert_eq!(accounts[0].password_hash, "hashed:correcta");
    assert_eq!(*catalog.source().calls.lock().unwrap(), vec![Procedure::UserByEmail]);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let catalog = scripted(vec![account_row("v@example.com", "hashed:vieja")]);

    let err = catalog
        .change_password("v@example.com", "otra", "nueva")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(*catalog.source().calls.lock().unwrap(), vec![Procedure::UserByEmail]);

    let ok = catalog
        .change_password("v@example.com", "vieja", "nueva")
        .await
        .unwrap();
    assert_eq!(ok, Confirmation::Done);
    assert_eq!(
        catalog.source().calls.lock().unwrap().last(),
        Some(&Procedure::ChangePassword)
    );
}

#[tokio::test]
async fn malformed_account_row_is_a_validation_error() {
    let mut row = account_row("v@example.com", "hashed:x");
    row.remove("password_hash");
    let catalog = scripted(vec![row]);

    let err = catalog.login("v@example.com", "x").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err:?}");
    assert_eq!(catalog.hasher.verifications.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn register_and_login_against_sqlite_with_bcrypt() {
    let hasher = BcryptHasher::new(&HashingConfig { cost: 4 });
    let (_tmp, catalog) = sqlite_catalog_with(hasher, MemoryUploader::default());

    let confirmation = catalog
        .register("Visitante", "v@example.com", "secreto")
        .await
        .unwrap();
    assert_eq!(confirmation, Confirmation::Registered);

    let accounts = catalog.login("v@example.com", "secreto").await.unwrap();
    assert_eq!(accounts[0].full_name, "Visitante");
    assert_eq!(accounts[0].role, "visitor");
    assert_ne!(accounts[0].password_hash, "secreto");

    catalog
        .change_password("v@example.com", "secreto", "otro")
        .await
        .unwrap();
    assert!(matches!(
        catalog.login("v@example.com", "secreto").await,
        Err(Error::Authentication(_))
    ));
    catalog.login("v@example.com", "otro").await.unwrap();
}

#[tokio::test]
async fn duplicate_registration_surfaces_the_query_error() {
    let (_tmp, catalog) = sqlite_catalog();

    catalog.register("A", "a@example.com", "x").await.unwrap();
    let err = catalog.register("B", "a@example.com", "y").await.unwrap_err();

    assert!(matches!(err, Error::Query { procedure: "register_user", .. }), "{err:?}");
}

#[tokio::test]
async fn sculptures_are_nested_and_deduplicated() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    let sculptures = catalog.sculptures().await.unwrap();

    let names: Vec<_> = sculptures.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ceibo", "Yaguareté"]);

    let ceibo = &sculptures[0];
    let ids: Vec<_> = ceibo.artists.iter().map(|a| a.national_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(ceibo.images.len(), 2);
    assert_eq!(ceibo.images[0].stage.as_deref(), Some("boceto"));
    assert_eq!(
        ceibo.images[0].url,
        "https://img.test/sculpture-images/image_Ceibo_boceto"
    );
    assert_eq!(
        ceibo.artist("1").unwrap().photo_url.as_deref(),
        Some("https://img.test/profile-picture/artist_1")
    );

    let yaguarete = &sculptures[1];
    assert_eq!(yaguarete.artists.len(), 1);
    assert!(yaguarete.images.is_empty());
}

#[tokio::test]
async fn sculptures_by_event_and_by_artist() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    let in_event = catalog.sculptures_by_event("Bienal").await.unwrap();
    assert_eq!(in_event.len(), 1);
    assert_eq!(in_event[0].name, "Ceibo");
    assert_eq!(in_event[0].artists.len(), 2);

    let by_luis = catalog.sculptures_by_artist("2").await.unwrap();
    let names: Vec<_> = by_luis.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ceibo", "Yaguareté"]);
    // coautores incluidos
    assert!(by_luis[0].artist("1").is_some());

    assert!(catalog.sculptures_by_event("Otra").await.unwrap().is_empty());
}

#[tokio::test]
async fn participants_of_a_sculpture() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;
    catalog.insert_event(new_event("Bienal", "Corrientes")).await.unwrap();

    let participants = catalog.sculpture_participants("Ceibo").await.unwrap();

    assert_eq!(participants.artists.len(), 2);
    let keys: Vec<_> = participants.events.iter().map(|e| e.key()).collect();
    assert_eq!(
        keys,
        vec![
            EventKey::new("Bienal", "Corrientes"),
            EventKey::new("Bienal", "Resistencia")
        ]
    );

    let alone = catalog.sculpture_participants("Yaguareté").await.unwrap();
    assert_eq!(alone.artists.len(), 1);
    assert!(alone.events.is_empty());
}

#[tokio::test]
async fn votes_feed_the_averages() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;
    catalog.register("A", "a@example.com", "x").await.unwrap();
    catalog.register("B", "b@example.com", "x").await.unwrap();

    catalog.record_vote(5, "Ceibo", "a@example.com").await.unwrap();
    catalog.record_vote(2, "Ceibo", "b@example.com").await.unwrap();
    // el segundo voto del mismo usuario reemplaza al primero
    catalog.record_vote(4, "Ceibo", "b@example.com").await.unwrap();

    let sculptures = catalog.sculptures().await.unwrap();
    assert_eq!(sculptures[0].rating.as_f64(), Some(4.5));
    assert_eq!(sculptures[1].rating, AvgRating::Unrated);

    let events = catalog.events().await.unwrap();
    assert_eq!(events[0].rating.as_f64(), Some(4.5));

    let artists = catalog.artists().await.unwrap();
    let ana = artists.iter().find(|a| a.national_id == "1").unwrap();
    assert_eq!(ana.rating.as_f64(), Some(4.5));
}

#[tokio::test]
async fn out_of_range_vote_is_rejected_before_io() {
    let catalog = scripted(vec![]);

    for rating in [0, 6] {
        let err = catalog.record_vote(rating, "Ceibo", "a@example.com").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
    assert!(catalog.source().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn artist_insert_validates_before_uploading() {
    let (_tmp, catalog) = sqlite_catalog();

    let err = catalog
        .insert_artist(new_artist("1", "Ana"), ImagePayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = catalog
        .insert_artist(new_artist("  ", "Ana"), photo())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert_eq!(catalog.uploader.count(), 0);
}

#[tokio::test]
async fn failed_upload_aborts_the_insert() {
    let (_tmp, catalog) = sqlite_catalog_with(CountingHasher::default(), MemoryUploader::failing());

    let err = catalog
        .insert_artist(new_artist("1", "Ana"), photo())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(UploadError::Rejected { status: 401, .. })));
    assert!(catalog.artists().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_insert_after_upload_keeps_the_upload() {
    let (_tmp, catalog) = sqlite_catalog();
    catalog.insert_artist(new_artist("1", "Ana"), photo()).await.unwrap();

    let err = catalog
        .insert_artist(new_artist("1", "Otra Ana"), photo())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Query { procedure: "insert_artist", .. }));
    assert_eq!(catalog.uploader.count(), 2);
}

#[tokio::test]
async fn artist_password_is_stored_hashed() {
    let (_tmp, catalog) = sqlite_catalog();
    let mut artist = new_artist("1", "Ana");
    artist.password = Some("clave".into());
    catalog.insert_artist(artist, photo()).await.unwrap();

    let conn = rusqlite::Connection::open(catalog.source().path()).unwrap();
    let stored: String = conn
        .query_row(
            "SELECT password_hash FROM artists WHERE national_id = '1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "hashed:clave");
}

#[tokio::test]
async fn quotes_in_values_are_stored_verbatim() {
    let (_tmp, catalog) = sqlite_catalog();

    let name = "O'Higgins'); DROP TABLE events; --";
    catalog.insert_event(new_event(name, "Resistencia")).await.unwrap();

    let events = catalog.events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, name);
}

#[tokio::test]
async fn update_event_renames_its_competitions() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    let confirmation = catalog
        .update_event(
            &EventKey::new("Bienal", "Resistencia"),
            EventUpdate {
                name: "Bienal 2026".to_string(),
                location: "Resistencia".to_string(),
                theme: Some("Agua".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmation, Confirmation::EventUpdated);

    assert!(catalog.sculptures_by_event("Bienal").await.unwrap().is_empty());
    assert_eq!(catalog.sculptures_by_event("Bienal 2026").await.unwrap().len(), 1);

    let events = catalog.events().await.unwrap();
    assert_eq!(events[0].theme.as_deref(), Some("Agua"));
    assert_eq!(events[0].starts_on, None);
}

#[tokio::test]
async fn update_or_delete_of_missing_rows_is_not_found() {
    let (_tmp, catalog) = sqlite_catalog();

    let missing = EventKey::new("Nada", "Ningún lado");
    assert!(matches!(
        catalog.delete_event(&missing).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        catalog
            .update_event(
                &missing,
                EventUpdate {
                    name: "x".into(),
                    location: "y".into(),
                    ..Default::default()
                }
            )
            .await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(catalog.delete_artist("404").await, Err(Error::NotFound(_))));
    assert!(matches!(
        catalog.delete_sculpture("Nada").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn blank_identities_are_rejected_before_io() {
    let catalog = scripted(vec![account_row("v@example.com", "hashed:x")]);
    let blank = EventKey::new("", "");

    let results = [
        catalog.delete_artist("").await,
        catalog.delete_sculpture("  ").await,
        catalog.delete_event(&blank).await,
        catalog
            .update_event(
                &blank,
                EventUpdate {
                    name: "Bienal".into(),
                    location: "Resistencia".into(),
                    ..Default::default()
                },
            )
            .await,
        catalog
            .update_artist(
                " ",
                ArtistUpdate {
                    national_id: "1".into(),
                    given_name: "Ana".into(),
                    ..Default::default()
                },
            )
            .await,
        catalog.change_password("", "x", "y").await,
    ];
    for result in results {
        assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
    }
    assert!(matches!(catalog.login("", "x").await, Err(Error::Validation(_))));

    assert!(catalog.source().calls.lock().unwrap().is_empty());
    assert_eq!(catalog.hasher.verifications.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn competes_requires_an_existing_event() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    let err = catalog.insert_competes("Fantasma", "Ceibo").await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "{err:?}");
    assert!(catalog.sculptures_by_event("Fantasma").await.unwrap().is_empty());
}

#[tokio::test]
async fn unmatched_event_update_leaves_competitions_untouched() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;
    // inscripción heredada de un evento que ya no existe
    rusqlite::Connection::open(catalog.source().path())
        .unwrap()
        .execute(
            "INSERT INTO competes (event_name, sculpture_name) VALUES ('Fantasma', 'Yaguareté')",
            [],
        )
        .unwrap();

    let missing = EventKey::new("Fantasma", "Ningún lado");
    let err = catalog
        .update_event(
            &missing,
            EventUpdate {
                name: "Robada".into(),
                location: "Ningún lado".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(catalog.sculptures_by_event("Robada").await.unwrap().is_empty());

    assert!(matches!(catalog.delete_event(&missing).await, Err(Error::NotFound(_))));
    assert_eq!(catalog.sculptures_by_event("Fantasma").await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_event_keeps_competitions_of_a_namesake() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;
    catalog.insert_event(new_event("Bienal", "Corrientes")).await.unwrap();

    catalog
        .delete_event(&EventKey::new("Bienal", "Corrientes"))
        .await
        .unwrap();
    assert_eq!(catalog.sculptures_by_event("Bienal").await.unwrap().len(), 1);

    let confirmation = catalog
        .delete_event(&EventKey::new("Bienal", "Resistencia"))
        .await
        .unwrap();
    assert_eq!(confirmation, Confirmation::EventDeleted);
    assert!(catalog.sculptures_by_event("Bienal").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_artist_cascades_the_new_national_id() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    catalog
        .update_artist(
            "1",
            ArtistUpdate {
                national_id: "10".to_string(),
                given_name: "Ana María".to_string(),
                family_name: "Quiroga".to_string(),
                biography: None,
                contact: Some("ana@example.com".to_string()),
                photo_url: None,
                password: None,
            },
        )
        .await
        .unwrap();

    let ceibo = catalog.sculptures_by_artist("10").await.unwrap();
    assert_eq!(ceibo.len(), 1);
    let ana = ceibo[0].artist("10").unwrap();
    assert_eq!(ana.full_name, "Ana María Quiroga");
    // sin foto nueva se conserva la anterior
    assert_eq!(
        ana.photo_url.as_deref(),
        Some("https://img.test/profile-picture/artist_1")
    );
}

#[tokio::test]
async fn deletes_cascade_to_relations() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    catalog.delete_artist("1").await.unwrap();
    let sculptures = catalog.sculptures().await.unwrap();
    assert_eq!(sculptures[0].artists.len(), 1);

    assert_eq!(
        catalog.delete_sculpture("Ceibo").await.unwrap(),
        Confirmation::SculptureDeleted
    );
    let names: Vec<_> = catalog
        .sculptures()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Yaguareté".to_string()]);
    assert!(catalog.sculptures_by_event("Bienal").await.unwrap().is_empty());
}

#[tokio::test]
async fn image_insert_requires_stage_and_payload() {
    let (_tmp, catalog) = sqlite_catalog();

    assert!(matches!(
        catalog.insert_image("", "Ceibo", photo()).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        catalog.insert_image("boceto", "Ceibo", ImagePayload::default()).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        catalog.insert_competes("", "Ceibo").await,
        Err(Error::Validation(_))
    ));
    assert_eq!(catalog.uploader.count(), 0);
}

#[tokio::test]
async fn concurrent_reads_are_independent() {
    let (_tmp, catalog) = sqlite_catalog();
    seed(&catalog).await;

    let (a, b, c) = tokio::join!(catalog.sculptures(), catalog.artists(), catalog.events());

    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 2);
    assert_eq!(c.unwrap().len(), 1);
}
