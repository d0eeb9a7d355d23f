use std::path::{Path, PathBuf};

use sled::IVec;

use crate::game::errors::GameError;
use crate::game::ports::{PlayerStore, TeamStore};
use crate::game::types::{Player, PlayerId, Team, PLAYER_SCHEMA_VERSION, TEAM_SCHEMA_VERSION};

const TREE_PLAYERS: &str = "cowcow_players";
const TREE_TEAMS: &str = "cowcow_teams";
const CURRENT_TEAM_KEY: &[u8] = b"team:current";

/// Builder so tests can open throwaway stores at custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
    flush_on_write: bool,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_write: true,
        }
    }

    /// Skip the fsync after every write; sled still flushes in the background.
    pub fn without_flush(mut self) -> Self {
        self.flush_on_write = false;
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open_with_options(self.path, self.flush_on_write)
    }
}

/// Sled-backed player and team persistence.
pub struct GameStore {
    _db: sled::Db,
    players: sled::Tree,
    teams: sled::Tree,
    flush_on_write: bool,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_on_write: bool) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        let teams = db.open_tree(TREE_TEAMS)?;
        Ok(Self {
            _db: db,
            players,
            teams,
            flush_on_write,
        })
    }

    fn player_key(id: &PlayerId) -> Vec<u8> {
        format!("players:{}", id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn flush(&self, tree: &sled::Tree) -> Result<(), GameError> {
        if self.flush_on_write {
            tree.flush()?;
        }
        Ok(())
    }

    fn check_player(record: Player) -> Result<Player, GameError> {
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Remove every stored player and the current team.
    pub fn clear(&self) -> Result<(), GameError> {
        self.players.clear()?;
        self.teams.clear()?;
        self.flush(&self.players)?;
        self.flush(&self.teams)
    }
}

impl PlayerStore for GameStore {
    fn get_player(&self, id: &PlayerId) -> Result<Player, GameError> {
        let Some(bytes) = self.players.get(Self::player_key(id))? else {
            return Err(GameError::NotFound {
                entity: "player",
                key: id.to_string(),
            });
        };
        Self::check_player(Self::deserialize(bytes)?)
    }

    fn update_player(&self, player: &Player) -> Result<(), GameError> {
        let mut record = player.clone();
        record.schema_version = PLAYER_SCHEMA_VERSION;
        record.touch();
        let bytes = Self::serialize(&record)?;
        self.players.insert(Self::player_key(&record.id), bytes)?;
        self.flush(&self.players)
    }

    fn delete_player(&self, id: &PlayerId) -> Result<(), GameError> {
        self.players.remove(Self::player_key(id))?;
        self.flush(&self.players)
    }

    fn list_players(&self) -> Result<Vec<Player>, GameError> {
        let mut players = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (_, bytes) = entry?;
            players.push(Self::check_player(Self::deserialize(bytes)?)?);
        }
        players.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(players)
    }
}

impl TeamStore for GameStore {
    fn load_team(&self) -> Result<Option<Team>, GameError> {
        let Some(bytes) = self.teams.get(CURRENT_TEAM_KEY)? else {
            return Ok(None);
        };
        let team: Team = Self::deserialize(bytes)?;
        if team.schema_version != TEAM_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "team",
                expected: TEAM_SCHEMA_VERSION,
                found: team.schema_version,
            });
        }
        Ok(Some(team))
    }

    fn save_team(&self, team: &Team) -> Result<(), GameError> {
        let mut record = team.clone();
        record.schema_version = TEAM_SCHEMA_VERSION;
        let bytes = Self::serialize(&record)?;
        self.teams.insert(CURRENT_TEAM_KEY, bytes)?;
        self.flush(&self.teams)
    }
}
