pub mod documents {
    pub mod delete_file_route;
    pub mod document_requests;
    pub mod index_document_route;
    pub mod list_files_route;
}
pub mod enhanced_search {
    pub mod enhanced_search_request;
    pub mod enhanced_search_route;
}
pub mod health_route;
