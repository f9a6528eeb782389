//! Cached authentication data
// (c) 2024 Ross Younger
//!
//! Credentials are cached in the user's configuration area, one file per
//! (credential kind, realm) pair:
//!
//! ```text
//! ~/.subversion/auth/<kind>/<md5 of realm string>
//! ```
//!
//! Each file holds a flat key/value map. Every record also carries the realm string itself
//! under [`REALMSTRING_KEY`], so that readers can check they have loaded the record they
//! asked for. Records are always replaced wholesale.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write as _},
    os::unix::fs::OpenOptionsExt as _,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    os::AbstractPlatform,
};

mod hashfile;

/// Key under which every record stores its realm string
pub const REALMSTRING_KEY: &str = "svn:realmstring";

/// Name of the credential cache directory within a configuration directory
pub const AUTH_DIR: &str = "auth";

/// A credential record
pub type Credentials = BTreeMap<String, String>;

/// Reads and writes credential records beneath a configuration directory
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct AuthStore {
    root: PathBuf,
}

fn not_a_file(path: &Path) -> Error {
    Error::io(
        format!("accessing {}", path.display()),
        std::io::Error::other("not a regular file"),
    )
}

impl AuthStore {
    /// Creates a store for the credential area of the given configuration directory.
    /// Nothing is touched on disk until a record is written.
    #[must_use]
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            root: config_dir.as_ref().join(AUTH_DIR),
        }
    }

    /// Creates a store in the current user's configuration directory, if there is one
    #[must_use]
    pub fn for_user<P: AbstractPlatform>() -> Option<Self> {
        P::user_config_dir().map(Self::new)
    }

    /// The directory holding all records
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file which holds (or would hold) a given record.
    ///
    /// The credential kind must be a plain file name.
    pub fn record_path(&self, kind: &str, realm: &str) -> Result<PathBuf> {
        if kind.is_empty() || kind == "." || kind == ".." || kind.contains(['/', '\\', '\0']) {
            return Err(Error::Unrepresentable {
                what: format!("credential kind {kind:?}"),
                reason: "not a plain file name",
            });
        }
        let digest = md5::compute(realm.as_bytes());
        Ok(self.root.join(kind).join(format!("{digest:x}")))
    }

    /// Reads a credential record.
    ///
    /// Returns `None` if there is no such record. The returned map includes
    /// [`REALMSTRING_KEY`] as stored; it is up to the caller to compare it with `realm`.
    pub fn read_auth_data(&self, kind: &str, realm: &str) -> Result<Option<Credentials>> {
        let path = self.record_path(kind, realm)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("no cached {kind} credentials for {realm:?}");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(format!("opening {}", path.display()), e)),
        };
        let meta = file
            .metadata()
            .map_err(|e| Error::io(format!("examining {}", path.display()), e))?;
        if !meta.is_file() {
            return Err(not_a_file(&path));
        }
        let data = hashfile::read_hash(&mut BufReader::new(file), &path.to_string_lossy())?;
        debug!("read cached {kind} credentials for {realm:?}");
        Ok(Some(data))
    }

    /// Writes a credential record, replacing any existing one.
    ///
    /// [`REALMSTRING_KEY`] is set to `realm`, whatever `data` holds for it.
    /// The record's directory is created if necessary.
    pub fn write_auth_data(&self, kind: &str, realm: &str, data: &Credentials) -> Result<()> {
        let path = self.record_path(kind, realm)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| Error::io(format!("creating {}", dir.display()), e))?;
        }
        match fs::symlink_metadata(&path) {
            Ok(meta) if !meta.is_file() => return Err(not_a_file(&path)),
            Ok(_) => (),
            Err(e) if e.kind() == ErrorKind::NotFound => (),
            Err(e) => return Err(Error::io(format!("examining {}", path.display()), e)),
        }

        let mut record = data.clone();
        let _ = record.insert(REALMSTRING_KEY.to_owned(), realm.to_owned());

        let context = || format!("writing {}", path.display());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)
            .map_err(|e| Error::io(context(), e))?;
        let mut writer = BufWriter::new(file);
        hashfile::write_hash(&mut writer, &record).map_err(|e| Error::io(context(), e))?;
        writer.flush().map_err(|e| Error::io(context(), e))?;
        debug!("cached {kind} credentials for {realm:?}");
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use assertables::assert_contains;

    use super::{AuthStore, Credentials, REALMSTRING_KEY};
    use crate::Error;

    const REALM: &str = "<https://svn.example.com:443> Example Realm";

    fn creds(pairs: &[(&str, &str)]) -> Credentials {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn absent_is_not_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        assert_eq!(store.read_auth_data("username", "realm-X")?, None);
        Ok(())
    }

    #[test]
    fn write_then_read() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        store.write_auth_data("username", "realm-X", &creds(&[("username", "alice")]))?;
        let data = store.read_auth_data("username", "realm-X")?.unwrap();
        assert_eq!(
            data,
            creds(&[("username", "alice"), (REALMSTRING_KEY, "realm-X")])
        );
        // A different realm or kind is a different record
        assert_eq!(store.read_auth_data("username", "realm-Y")?, None);
        assert_eq!(store.read_auth_data("password", "realm-X")?, None);
        Ok(())
    }

    #[test]
    fn overwrite_is_wholesale() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        store.write_auth_data(
            "svn.simple",
            REALM,
            &creds(&[("username", "alice"), ("password", "hunter2")]),
        )?;
        store.write_auth_data("svn.simple", REALM, &creds(&[("username", "bob")]))?;
        let data = store.read_auth_data("svn.simple", REALM)?.unwrap();
        assert_eq!(data.get("username").map(String::as_str), Some("bob"));
        assert!(!data.contains_key("password"));
        Ok(())
    }

    #[test]
    fn realm_key_cannot_be_spoofed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        store.write_auth_data("k", REALM, &creds(&[(REALMSTRING_KEY, "forged")]))?;
        let data = store.read_auth_data("k", REALM)?.unwrap();
        assert_eq!(data[REALMSTRING_KEY], REALM);
        Ok(())
    }

    #[test]
    fn file_naming() -> Result<()> {
        let store = AuthStore::new("/cfg");
        let path = store.record_path("svn.simple", "realm")?;
        // md5("realm")
        assert_eq!(
            path.to_string_lossy(),
            "/cfg/auth/svn.simple/b94b7ef7f17d2394d6fbdf458dadc7b0"
        );
        assert!(store
            .record_path("k", "")?
            .ends_with("k/d41d8cd98f00b204e9800998ecf8427e"));
        for bad in ["", ".", "..", "a/b", "../up"] {
            let err = store.record_path(bad, "realm").unwrap_err();
            assert!(matches!(err, Error::Unrepresentable { .. }), "{bad:?}");
        }
        Ok(())
    }

    #[test]
    fn directory_in_the_way() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        let path = store.record_path("username", "realm-X")?;
        std::fs::create_dir_all(&path)?;
        let err = store
            .write_auth_data("username", "realm-X", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_contains!(err.to_string(), "not a regular file");
        let err = store.read_auth_data("username", "realm-X").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        Ok(())
    }

    #[test]
    fn file_in_place_of_kind_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        std::fs::create_dir_all(store.root())?;
        std::fs::write(store.root().join("username"), "oops")?;
        let err = store
            .write_auth_data("username", "realm-X", &BTreeMap::new())
            .unwrap_err();
        assert_contains!(err.to_string(), "creating");
        Ok(())
    }

    #[test]
    fn corrupt_record() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        let path = store.record_path("username", "realm-X")?;
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(&path, "K 8\nusername\nV 5\nal")?;
        let err = store.read_auth_data("username", "realm-X").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn records_are_private() -> Result<()> {
        use std::os::unix::fs::PermissionsExt as _;
        let dir = tempfile::tempdir()?;
        let store = AuthStore::new(dir.path());
        store.write_auth_data("username", "realm-X", &BTreeMap::new())?;
        let meta = std::fs::metadata(store.record_path("username", "realm-X")?)?;
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        Ok(())
    }
}
