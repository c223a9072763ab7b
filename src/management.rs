//! Typed client for the management REST surface.
//!
//! Every call goes through [`Session::dispatch`], so expired access tokens are renewed and
//! the call replayed transparently. Non-2xx answers become [`Error::Api`] with the raw body so
//! the collaborator layer can show it inline; undecodable payloads become [`Error::Decode`].

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{ApiRequest, ApiResponse, Transport, Verb},
	model::{Collection, Endpoint, EndpointResponse, RecordId},
	obs::ApiSurface,
	session::Session,
};

/// Management resources exposed below the API prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
	/// `collections/`, keyed by slug.
	Collections,
	/// `endpoints/`, keyed by id and filterable by collection slug.
	Endpoints,
	/// `responses/`, keyed by id and filterable by endpoint id.
	Responses,
}
impl Resource {
	/// Collection path relative to the API prefix.
	pub const fn path(self) -> &'static str {
		match self {
			Resource::Collections => "collections/",
			Resource::Endpoints => "endpoints/",
			Resource::Responses => "responses/",
		}
	}

	const fn filter_key(self) -> Option<&'static str> {
		match self {
			Resource::Collections => None,
			Resource::Endpoints => Some("collection"),
			Resource::Responses => Some("endpoint"),
		}
	}
}

/// CRUD calls against collections, endpoints, and responses.
pub struct ManagementApi<T>
where
	T: ?Sized + Transport,
{
	session: Session<T>,
}
impl<T> ManagementApi<T>
where
	T: ?Sized + Transport,
{
	/// Wraps a session; the API shares its credentials.
	pub fn new(session: Session<T>) -> Self {
		Self { session }
	}

	/// Underlying session.
	pub fn session(&self) -> &Session<T> {
		&self.session
	}

	/// Lists every collection.
	pub async fn list_collections(&self) -> Result<Vec<Collection>> {
		self.fetch(Verb::Get, Resource::Collections, None, None).await
	}

	/// Fetches a collection by slug.
	pub async fn get_collection(&self, slug: &str) -> Result<Collection> {
		self.fetch(Verb::Get, Resource::Collections, Some(slug), None).await
	}

	/// Creates a collection.
	pub async fn create_collection(&self, collection: &Collection) -> Result<Collection> {
		self.fetch(Verb::Post, Resource::Collections, None, Some(to_body(collection)?)).await
	}

	/// Replaces a collection.
	pub async fn update_collection(&self, slug: &str, collection: &Collection) -> Result<Collection> {
		self.fetch(Verb::Put, Resource::Collections, Some(slug), Some(to_body(collection)?)).await
	}

	/// Deletes a collection and, server-side, its endpoints.
	pub async fn delete_collection(&self, slug: &str) -> Result<()> {
		self.delete(Resource::Collections, slug).await
	}

	/// Lists the endpoints of a collection.
	pub async fn list_endpoints(&self, collection_slug: &str) -> Result<Vec<Endpoint>> {
		self.list_filtered(Resource::Endpoints, collection_slug).await
	}

	/// Fetches an endpoint by id.
	pub async fn get_endpoint(&self, id: RecordId) -> Result<Endpoint> {
		self.fetch(Verb::Get, Resource::Endpoints, Some(&id.to_string()), None).await
	}

	/// Creates an endpoint.
	pub async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<Endpoint> {
		self.fetch(Verb::Post, Resource::Endpoints, None, Some(to_body(endpoint)?)).await
	}

	/// Replaces an endpoint.
	pub async fn update_endpoint(&self, id: RecordId, endpoint: &Endpoint) -> Result<Endpoint> {
		self.fetch(Verb::Put, Resource::Endpoints, Some(&id.to_string()), Some(to_body(endpoint)?))
			.await
	}

	/// Deletes an endpoint.
	pub async fn delete_endpoint(&self, id: RecordId) -> Result<()> {
		self.delete(Resource::Endpoints, &id.to_string()).await
	}

	/// Lists the alternative responses of an endpoint.
	pub async fn list_responses(&self, endpoint_id: RecordId) -> Result<Vec<EndpointResponse>> {
		self.list_filtered(Resource::Responses, &endpoint_id.to_string()).await
	}

	/// Creates an alternative response.
	pub async fn create_response(&self, response: &EndpointResponse) -> Result<EndpointResponse> {
		self.fetch(Verb::Post, Resource::Responses, None, Some(to_body(response)?)).await
	}

	/// Replaces an alternative response.
	pub async fn update_response(
		&self,
		id: RecordId,
		response: &EndpointResponse,
	) -> Result<EndpointResponse> {
		self.fetch(Verb::Put, Resource::Responses, Some(&id.to_string()), Some(to_body(response)?))
			.await
	}

	/// Deletes an alternative response.
	pub async fn delete_response(&self, id: RecordId) -> Result<()> {
		self.delete(Resource::Responses, &id.to_string()).await
	}

	async fn list_filtered<R>(&self, resource: Resource, filter: &str) -> Result<Vec<R>>
	where
		R: for<'de> Deserialize<'de>,
	{
		let mut url = self.resource_url(resource, None)?;

		if let Some(key) = resource.filter_key() {
			url.query_pairs_mut().append_pair(key, filter);
		}

		decode(self.send(ApiRequest::new(Verb::Get, url)).await?)
	}

	async fn fetch<R>(
		&self,
		method: Verb,
		resource: Resource,
		key: Option<&str>,
		body: Option<JsonValue>,
	) -> Result<R>
	where
		R: for<'de> Deserialize<'de>,
	{
		let url = self.resource_url(resource, key)?;

		decode(self.send(ApiRequest::new(method, url).maybe_json(body)).await?)
	}

	async fn delete(&self, resource: Resource, key: &str) -> Result<()> {
		let url = self.resource_url(resource, Some(key))?;

		self.send(ApiRequest::new(Verb::Delete, url)).await.map(|_| ())
	}

	async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let response = self.session.dispatch(request).await?;

		if response.is_success() {
			Ok(response)
		} else {
			Err(Error::Api { status: response.status, body: response.text() })
		}
	}

	fn resource_url(&self, resource: Resource, key: Option<&str>) -> Result<Url, ConfigError> {
		let key = key.map(|key| format!("{key}/")).unwrap_or_default();

		self.session.config.url_for(ApiSurface::Management, resource.path(), &key)
	}
}
impl<T> Clone for ManagementApi<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self { session: self.session.clone() }
	}
}
impl<T> Debug for ManagementApi<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ManagementApi").field("session", &self.session).finish()
	}
}

fn to_body(value: &impl Serialize) -> Result<JsonValue> {
	serde_json::to_value(value).map_err(|e| ConfigError::Body(e).into())
}

fn decode<R>(response: ApiResponse) -> Result<R>
where
	R: for<'de> Deserialize<'de>,
{
	response.json().map_err(|source| Error::Decode { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn resource_paths_match_management_routes() {
		assert_eq!(Resource::Collections.path(), "collections/");
		assert_eq!(Resource::Endpoints.filter_key(), Some("collection"));
		assert_eq!(Resource::Responses.filter_key(), Some("endpoint"));
		assert_eq!(Resource::Collections.filter_key(), None);
	}
}
