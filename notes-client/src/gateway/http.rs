use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{Error, ErrorResponse, NotesGateway};
use crate::{
    notes::{Note, NoteFields, NoteId, ShareResponse},
    session::Session,
    Result,
};

fn notes_url(api_url: &str) -> String {
    format!("{}/api/notes", api_url.trim_end_matches('/'))
}

fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build().map_err(Error::from)?)
}

/// Passes successful responses through and turns the rest into
/// [`Error::Status`], keeping the service's error body when it sent one.
pub(crate) async fn error_for_status(response: Response) -> std::result::Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let response = response.json::<ErrorResponse>().await.ok();
    Err(Error::Status {
        status: status.as_u16(),
        response,
    })
}

/// [`NotesGateway`] over the service's JSON API. Every request carries the
/// bearer token of the session it was built with.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    notes_url: String,
    session: Session,
}

impl HttpGateway {
    pub fn new(api_url: &str, session: Session, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: client(timeout)?,
            notes_url: notes_url(api_url),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn note_url(&self, id: NoteId) -> String {
        format!("{}/{id}", self.notes_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(self.session.token())
            .send()
            .await
            .map_err(Error::from)?;

        Ok(error_for_status(response).await?)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await.map_err(Error::from)?)
    }
}

#[async_trait]
impl NotesGateway for HttpGateway {
    async fn list(&self) -> Result<Vec<Note>> {
        tracing::debug!(url = %self.notes_url, "listing notes");
        self.json(self.client.get(&self.notes_url)).await
    }

    async fn create(&self, fields: &NoteFields) -> Result<Note> {
        tracing::debug!("creating note");
        self.json(self.client.post(&self.notes_url).json(fields)).await
    }

    async fn update(&self, id: NoteId, fields: &NoteFields) -> Result<Note> {
        tracing::debug!(id, "updating note");
        self.json(self.client.put(self.note_url(id)).json(fields))
            .await
            .map_err(|e| e.not_found_message("Note not found"))
    }

    async fn delete(&self, id: NoteId) -> Result<()> {
        tracing::debug!(id, "deleting note");
        self.send(self.client.delete(self.note_url(id)))
            .await
            .map(|_| ())
            .map_err(|e| e.not_found_message("Note not found"))
    }

    async fn share(&self, id: NoteId) -> Result<String> {
        tracing::debug!(id, "sharing note");
        let ShareResponse { share_link } = self
            .json::<ShareResponse>(self.client.post(format!("{}/share", self.note_url(id))))
            .await
            .map_err(|e| e.not_found_message("Note not found"))?;

        if share_link.trim().is_empty() {
            return Err(Error::EmptyBody("share link").into());
        }
        Ok(share_link)
    }
}

/// The last path segment of a share link, or the input itself when it is
/// already a bare id.
pub fn share_id_from_link(link: &str) -> &str {
    let link = link.trim();
    let link = link.split(['?', '#']).next().unwrap_or(link);
    link.trim_end_matches('/').rsplit('/').next().unwrap_or(link)
}

/// Read-only access to published notes. Needs no session.
#[derive(Clone)]
pub struct PublicNotes {
    client: Client,
    public_url: String,
}

impl PublicNotes {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: client(timeout)?,
            public_url: format!("{}/public", notes_url(api_url)),
        })
    }

    /// Accepts either a share id or a whole share link.
    pub async fn fetch(&self, share: &str) -> Result<Note> {
        let share_id = share_id_from_link(share);
        tracing::debug!(share_id, "fetching shared note");

        let response = self
            .client
            .get(format!("{}/{share_id}", self.public_url))
            .send()
            .await
            .map_err(Error::from)?;
        let response = error_for_status(response)
            .await
            .map_err(crate::Error::from)
            .map_err(|e| e.not_found_message("Note not found"))?;

        Ok(response.json::<Note>().await.map_err(Error::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-token";

    fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(&server.uri(), Session::new(TOKEN), Duration::from_secs(5)).unwrap()
    }

    fn note_json(id: NoteId, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "content": "body",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notes"))
            .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([note_json(2, "second"), note_json(1, "first")])))
            .expect(1)
            .mount(&server)
            .await;

        let notes = gateway(&server).list().await.unwrap();

        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(notes[1].title, "first");
    }

    #[tokio::test]
    async fn create_posts_trimmed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes"))
            .and(body_json(json!({ "title": "hello", "content": "world" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(note_json(7, "hello")))
            .mount(&server)
            .await;

        let fields = NoteFields {
            title: "hello".into(),
            content: "world".into(),
        };
        let note = gateway(&server).create(&fields).await.unwrap();

        assert_eq!(note.id, 7);
    }

    #[tokio::test]
    async fn update_of_missing_note_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/notes/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fields = NoteFields {
            title: "t".into(),
            content: "c".into(),
        };
        let error = gateway(&server).update(9, &fields).await.unwrap_err();

        assert!(matches!(error, crate::Error::NotFound(ref m) if m == "Note not found"));
    }

    #[tokio::test]
    async fn delete_with_expired_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/notes/3"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "unauthorized" })))
            .mount(&server)
            .await;

        let error = gateway(&server).delete(3).await.unwrap_err();

        assert!(error.is_unauthorized());
    }

    #[tokio::test]
    async fn delete_ignores_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/notes/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        gateway(&server).delete(3).await.unwrap();
    }

    #[tokio::test]
    async fn share_returns_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes/4/share"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "shareLink": "http://notes.test/share/abc" })))
            .mount(&server)
            .await;

        let link = gateway(&server).share(4).await.unwrap();

        assert_eq!(link, "http://notes.test/share/abc");
    }

    #[tokio::test]
    async fn empty_share_link_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes/4/share"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "shareLink": "" })))
            .mount(&server)
            .await;

        let error = gateway(&server).share(4).await.unwrap_err();

        assert!(matches!(error, crate::Error::Fetch { status: None, .. }));
    }

    #[tokio::test]
    async fn server_error_keeps_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notes"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "unexpected", "message": "database is down" })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).list().await.unwrap_err();

        assert!(
            matches!(error, crate::Error::Fetch { status: Some(500), ref message } if message == "database is down")
        );
    }

    #[tokio::test]
    async fn public_fetch_accepts_full_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notes/public/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(note_json(5, "shared")))
            .mount(&server)
            .await;

        let public = PublicNotes::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let note = public.fetch("http://localhost:5173/share/abc123").await.unwrap();

        assert_eq!(note.title, "shared");
    }

    #[tokio::test]
    async fn public_fetch_of_unknown_share_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notes/public/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let public = PublicNotes::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let error = public.fetch("missing").await.unwrap_err();

        assert!(matches!(error, crate::Error::NotFound(ref m) if m == "Note not found"));
    }

    #[test]
    fn share_id_from_link_variants() {
        assert_eq!(share_id_from_link("abc"), "abc");
        assert_eq!(share_id_from_link("https://notes.test/share/abc/"), "abc");
        assert_eq!(share_id_from_link(" https://notes.test/share/abc?ref=mail "), "abc");
    }
}
