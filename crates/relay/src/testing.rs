//! In-memory [`ChatClient`] for relay tests.

use std::{collections::HashSet, sync::Mutex};

use {
    async_trait::async_trait,
    hookfeed_chat::{Channel, ChatClient, Error, NewPost, Post, Result, Team, TeamMember, User},
};

#[derive(Default)]
struct State {
    me: Option<User>,
    teams: Vec<Team>,
    members: Vec<TeamMember>,
    channels: Vec<Channel>,
    posts: Vec<Post>,
    next_post: u64,
    calls: Vec<&'static str>,
    failing: HashSet<&'static str>,
}

/// Chat server double that records every call by operation name.
#[derive(Default)]
pub(crate) struct FakeChat {
    state: Mutex<State>,
}

impl FakeChat {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn with_me(self, user_id: &str) -> Self {
        self.state().me = Some(User {
            id: user_id.into(),
            username: "hookfeed".into(),
        });
        self
    }

    pub(crate) fn with_team(self, id: &str, name: &str) -> Self {
        self.state().teams.push(Team {
            id: id.into(),
            name: name.into(),
            display_name: name.to_uppercase(),
        });
        self
    }

    pub(crate) fn with_channel(self, id: &str, team_id: &str, name: &str) -> Self {
        self.state().channels.push(Channel {
            id: id.into(),
            team_id: team_id.into(),
            name: name.into(),
            display_name: name.into(),
        });
        self
    }

    pub(crate) fn add_member(&self, team_id: &str, user_id: &str) {
        self.state().members.push(TeamMember {
            team_id: team_id.into(),
            user_id: user_id.into(),
        });
    }

    pub(crate) fn is_member(&self, team_id: &str, user_id: &str) -> bool {
        self.state()
            .members
            .iter()
            .any(|m| m.team_id == team_id && m.user_id == user_id)
    }

    /// Insert a post directly, bypassing the call log.
    pub(crate) fn seed_post(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &str,
        pinned: bool,
    ) -> Post {
        let mut state = self.state();
        let post = new_post(&mut state, NewPost {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            message: message.into(),
            is_pinned: pinned,
        });
        state.posts.push(post.clone());
        post
    }

    pub(crate) fn posts(&self) -> Vec<Post> {
        self.state().posts.clone()
    }

    /// Make every later call to `op` fail with a server error.
    pub(crate) fn fail(&self, op: &'static str) {
        self.state().failing.insert(op);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub(crate) fn calls_of(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    fn record(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(op);
        if state.failing.contains(op) {
            return Err(Error::Status {
                status: 500,
                body: format!("{op} failed"),
            });
        }
        Ok(state)
    }
}

fn new_post(state: &mut State, post: NewPost) -> Post {
    state.next_post += 1;
    Post {
        id: format!("post-{}", state.next_post),
        channel_id: post.channel_id,
        user_id: post.user_id,
        message: post.message,
        is_pinned: post.is_pinned,
        create_at: i64::try_from(state.next_post).unwrap_or(i64::MAX),
        props: None,
    }
}

fn page<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    items
        .iter()
        .skip(page as usize * per_page as usize)
        .take(per_page as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn get_me(&self) -> Result<User> {
        let state = self.record("get_me")?;
        state
            .me
            .clone()
            .ok_or_else(|| Error::unavailable("not logged in"))
    }

    async fn get_team_by_name(&self, name: &str) -> Result<Team> {
        let state = self.record("get_team_by_name")?;
        state
            .teams
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("team", name))
    }

    async fn list_teams(&self, page_no: u32, per_page: u32) -> Result<Vec<Team>> {
        let state = self.record("list_teams")?;
        Ok(page(&state.teams, page_no, per_page))
    }

    async fn list_team_members(
        &self,
        team_id: &str,
        page_no: u32,
        per_page: u32,
    ) -> Result<Vec<TeamMember>> {
        let state = self.record("list_team_members")?;
        let members: Vec<TeamMember> = state
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        Ok(page(&members, page_no, per_page))
    }

    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<TeamMember> {
        let mut state = self.record("add_team_member")?;
        let member = TeamMember {
            team_id: team_id.into(),
            user_id: user_id.into(),
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn get_channel_by_name(
        &self,
        team_id: &str,
        name: &str,
        _include_deleted: bool,
    ) -> Result<Channel> {
        let state = self.record("get_channel_by_name")?;
        state
            .channels
            .iter()
            .find(|c| c.team_id == team_id && c.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("channel", name))
    }

    async fn list_public_channels(
        &self,
        team_id: &str,
        page_no: u32,
        per_page: u32,
    ) -> Result<Vec<Channel>> {
        let state = self.record("list_public_channels")?;
        let channels: Vec<Channel> = state
            .channels
            .iter()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect();
        Ok(page(&channels, page_no, per_page))
    }

    /// Newest first, like the real search.
    async fn search_posts(&self, team_id: &str, terms: &str) -> Result<Vec<Post>> {
        let state = self.record("search_posts")?;
        let in_team: HashSet<&str> = state
            .channels
            .iter()
            .filter(|c| c.team_id == team_id)
            .map(|c| c.id.as_str())
            .collect();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| in_team.contains(p.channel_id.as_str()) && p.message.contains(terms))
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.record("create_post")?;
        let post = new_post(&mut state, post);
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: &Post) -> Result<Post> {
        let mut state = self.record("update_post")?;
        let stored = state
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| Error::not_found("post", &post.id))?;
        *stored = post.clone();
        Ok(stored.clone())
    }
}
