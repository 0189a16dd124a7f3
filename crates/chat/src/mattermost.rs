//! Mattermost REST (v4) implementation of [`ChatClient`].

use std::{collections::HashMap, time::Duration};

use {
    async_trait::async_trait,
    reqwest::{RequestBuilder, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, de::DeserializeOwned},
    tracing::debug,
};

use crate::{
    ChatClient, Error, Result,
    types::{Channel, NewPost, Post, Team, TeamMember, User},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot-token authenticated Mattermost client.
pub struct MattermostClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct PostList {
    #[serde(default)]
    order: Vec<String>,
    #[serde(default)]
    posts: HashMap<String, Post>,
}

impl PostList {
    /// Posts in the order the server ranked them.
    fn into_ordered(mut self) -> Vec<Post> {
        self.order
            .iter()
            .filter_map(|id| self.posts.remove(id))
            .collect()
    }
}

impl MattermostClient {
    pub fn new(base_url: impl Into<String>, token: Secret<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_http(http, base_url, token))
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Secret<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4{path}", self.base_url.trim_end_matches('/'))
    }

    /// Send an authenticated request and decode the JSON answer.
    ///
    /// A 404 becomes [`Error::NotFound`] for `resource`/`name`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        name: &str,
    ) -> Result<T> {
        let resp = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(resource, name));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn pin_post(&self, post_id: &str) -> Result<()> {
        let path = format!("/posts/{}/pin", urlencoding::encode(post_id));
        let _: serde_json::Value = self
            .send(self.http.post(self.url(&path)), "post", post_id)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatClient for MattermostClient {
    async fn get_me(&self) -> Result<User> {
        self.send(self.http.get(self.url("/users/me")), "user", "me")
            .await
    }

    async fn get_team_by_name(&self, name: &str) -> Result<Team> {
        let path = format!("/teams/name/{}", urlencoding::encode(name));
        self.send(self.http.get(self.url(&path)), "team", name).await
    }

    async fn list_teams(&self, page: u32, per_page: u32) -> Result<Vec<Team>> {
        let request = self
            .http
            .get(self.url("/teams"))
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(request, "teams", "*").await
    }

    async fn list_team_members(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<TeamMember>> {
        let path = format!("/teams/{}/members", urlencoding::encode(team_id));
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(request, "team", team_id).await
    }

    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<TeamMember> {
        let path = format!("/teams/{}/members", urlencoding::encode(team_id));
        let request = self.http.post(self.url(&path)).json(&TeamMember {
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
        });
        self.send(request, "team", team_id).await
    }

    async fn get_channel_by_name(
        &self,
        team_id: &str,
        name: &str,
        include_deleted: bool,
    ) -> Result<Channel> {
        let path = format!(
            "/teams/{}/channels/name/{}",
            urlencoding::encode(team_id),
            urlencoding::encode(name)
        );
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("include_deleted", include_deleted)]);
        self.send(request, "channel", name).await
    }

    async fn list_public_channels(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Channel>> {
        let path = format!("/teams/{}/channels", urlencoding::encode(team_id));
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(request, "team", team_id).await
    }

    async fn search_posts(&self, team_id: &str, terms: &str) -> Result<Vec<Post>> {
        let path = format!("/teams/{}/posts/search", urlencoding::encode(team_id));
        let request = self.http.post(self.url(&path)).json(&serde_json::json!({
            "terms": terms,
            "is_or_search": false,
        }));
        let list: PostList = self.send(request, "team", team_id).await?;
        Ok(list.into_ordered())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let request = self.http.post(self.url("/posts")).json(&post);
        let mut created: Post = self.send(request, "channel", &post.channel_id).await?;
        // Older servers drop `is_pinned` on create.
        if post.is_pinned && !created.is_pinned {
            debug!(post_id = %created.id, "pinning freshly created post");
            self.pin_post(&created.id).await?;
            created.is_pinned = true;
        }
        Ok(created)
    }

    async fn update_post(&self, post: &Post) -> Result<Post> {
        let path = format!("/posts/{}", urlencoding::encode(&post.id));
        let request = self.http.put(self.url(&path)).json(&serde_json::json!({
            "id": post.id,
            "message": post.message,
            "is_pinned": post.is_pinned,
            "props": post.props,
        }));
        self.send(request, "post", &post.id).await
    }
}
