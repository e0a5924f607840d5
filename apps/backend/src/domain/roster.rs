//! Player and spectator lists with capacity limits and judge rotation.

use serde::{Deserialize, Serialize};

use crate::domain::cards_types::{CardId, Identity, ResponseCard, UserId};
use crate::errors::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Player,
    Judge,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: UserId,
    pub nickname: String,
    pub role: PlayerRole,
    pub score: u32,
    /// Set while the player owes an action this round (cards or a verdict).
    pub need_to_play: bool,
    hand: Vec<ResponseCard>,
}

impl Player {
    pub fn new(identity: Identity) -> Self {
        Self {
            id: identity.id,
            nickname: identity.nickname,
            role: PlayerRole::Player,
            score: 0,
            need_to_play: false,
            hand: Vec::new(),
        }
    }

    pub fn is_judge(&self) -> bool {
        self.role == PlayerRole::Judge
    }

    pub fn hand(&self) -> &[ResponseCard] {
        &self.hand
    }

    pub fn deal(&mut self, card: ResponseCard) {
        self.hand.push(card);
    }

    pub fn return_to_hand(&mut self, cards: impl IntoIterator<Item = ResponseCard>) {
        self.hand.extend(cards);
    }

    pub fn holds_all(&self, ids: &[CardId]) -> bool {
        ids.iter().all(|id| self.hand.iter().any(|c| c.id == *id))
    }

    /// Remove the given cards from hand, preserving the order of `ids`.
    pub fn take_cards(&mut self, ids: &[CardId]) -> Vec<ResponseCard> {
        let mut taken = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(pos) = self.hand.iter().position(|c| c.id == *id) {
                taken.push(self.hand.remove(pos));
            }
        }
        taken
    }

    pub fn clear_hand(&mut self) -> Vec<ResponseCard> {
        std::mem::take(&mut self.hand)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spectator {
    pub id: UserId,
    pub nickname: String,
}

impl From<Identity> for Spectator {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            nickname: identity.nickname,
        }
    }
}

/// Outcome of removing a player.
#[derive(Debug)]
pub struct RemovedPlayer {
    pub player: Player,
    pub was_judge: bool,
    /// Player who inherited the Judge role, if the removed player held it.
    pub successor: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct Roster {
    host_id: UserId,
    players: Vec<Player>,
    spectators: Vec<Spectator>,
}

impl Roster {
    /// A new roster with the host seated at index 0.
    pub fn new(host: Identity) -> Self {
        Self {
            host_id: host.id,
            players: vec![Player::new(host)],
            spectators: Vec::new(),
        }
    }

    pub fn host_id(&self) -> UserId {
        self.host_id
    }

    pub fn host(&self) -> Option<&Player> {
        self.player(self.host_id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn spectators(&self) -> &[Spectator] {
        &self.spectators
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    pub fn player(&self, id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: UserId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: UserId) -> bool {
        self.player(id).is_some()
    }

    pub fn has_spectator(&self, id: UserId) -> bool {
        self.spectators.iter().any(|s| s.id == id)
    }

    pub fn add_player(
        &mut self,
        identity: Identity,
        max_players: u32,
        accepting_players: bool,
    ) -> Result<(), StatusCode> {
        if !accepting_players {
            return Err(StatusCode::NotInLobbyState);
        }
        if self.has_player(identity.id) {
            return Err(StatusCode::AlreadyInSession);
        }
        if self.has_spectator(identity.id) {
            return Err(StatusCode::AlreadySpectating);
        }
        if self.players.len() + 1 > max_players as usize {
            return Err(StatusCode::MaxPlayersReached);
        }
        self.players.push(Player::new(identity));
        Ok(())
    }

    /// Remove a player. A departing judge hands the role to the next index
    /// before removal.
    pub fn remove_player(&mut self, id: UserId) -> Result<RemovedPlayer, StatusCode> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(StatusCode::NotInSession)?;

        let was_judge = self.players[index].is_judge();
        let mut successor = None;
        if was_judge && self.players.len() > 1 {
            let next = (index + 1) % self.players.len();
            self.players[next].role = PlayerRole::Judge;
            successor = Some(self.players[next].id);
        }

        let player = self.players.remove(index);
        Ok(RemovedPlayer {
            player,
            was_judge,
            successor,
        })
    }

    pub fn add_spectator(
        &mut self,
        identity: Identity,
        max_spectators: u32,
    ) -> Result<(), StatusCode> {
        if self.has_spectator(identity.id) {
            return Err(StatusCode::AlreadySpectating);
        }
        if self.has_player(identity.id) {
            return Err(StatusCode::AlreadyInSession);
        }
        if self.spectators.len() + 1 > max_spectators as usize {
            return Err(StatusCode::MaxSpectatorsReached);
        }
        self.spectators.push(Spectator::from(identity));
        Ok(())
    }

    pub fn remove_spectator(&mut self, id: UserId) -> Result<Spectator, StatusCode> {
        let index = self
            .spectators
            .iter()
            .position(|s| s.id == id)
            .ok_or(StatusCode::NotSpectating)?;
        Ok(self.spectators.remove(index))
    }

    pub fn judge_index(&self) -> Option<usize> {
        self.players.iter().position(Player::is_judge)
    }

    pub fn judge(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_judge())
    }

    pub fn judge_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_judge()).count()
    }

    /// Make the player at `index` the only judge.
    pub fn assign_judge(&mut self, index: usize) -> Option<UserId> {
        if index >= self.players.len() {
            return None;
        }
        for (i, player) in self.players.iter_mut().enumerate() {
            player.role = if i == index {
                PlayerRole::Judge
            } else {
                PlayerRole::Player
            };
        }
        Some(self.players[index].id)
    }

    /// Pass the Judge role to `(current + 1) mod n`, or to index 0 when
    /// nobody holds it.
    pub fn rotate_judge(&mut self) -> Option<UserId> {
        let next = match self.judge_index() {
            Some(current) => (current + 1) % self.players.len(),
            None => 0,
        };
        self.assign_judge(next)
    }

    pub fn clear_roles(&mut self) {
        for player in &mut self.players {
            player.role = PlayerRole::Player;
            player.need_to_play = false;
        }
    }

    /// True when every non-judge player has submitted this round.
    pub fn all_players_have_played(&self) -> bool {
        self.players
            .iter()
            .filter(|p| !p.is_judge())
            .all(|p| !p.need_to_play)
    }

    /// Ids of non-judge players still owing cards this round.
    pub fn pending_players(&self) -> Vec<UserId> {
        self.players
            .iter()
            .filter(|p| !p.is_judge() && p.need_to_play)
            .map(|p| p.id)
            .collect()
    }

    pub fn hand_card_count(&self) -> usize {
        self.players.iter().map(|p| p.hand().len()).sum()
    }
}
