// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The messages exchanged with the table admin service.

/// A table in a Bigtable instance.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Table {
    /// The full name of the table, in the form
    /// `projects/{project}/instances/{instance}/tables/{table}`.
    pub name: String,

    /// The column families in the table.
    pub column_families: Vec<String>,
}

impl Table {
    /// Sets the value of [name][Table::name].
    pub fn set_name<T: Into<String>>(mut self, v: T) -> Self {
        self.name = v.into();
        self
    }

    /// Sets the value of [column_families][Table::column_families].
    pub fn set_column_families<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.column_families = v.into_iter().map(|v| v.into()).collect();
        self
    }
}

/// How much of the table is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableView {
    #[default]
    Unspecified,
    /// Only the table name.
    NameOnly,
    /// The table name and its schema.
    SchemaView,
    /// All the table fields.
    Full,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct CreateTableRequest {
    /// The instance creating the table, in the form
    /// `projects/{project}/instances/{instance}`.
    pub parent: String,
    pub table_id: String,
    pub table: Table,
}

impl CreateTableRequest {
    pub fn set_parent<T: Into<String>>(mut self, v: T) -> Self {
        self.parent = v.into();
        self
    }

    pub fn set_table_id<T: Into<String>>(mut self, v: T) -> Self {
        self.table_id = v.into();
        self
    }

    pub fn set_table(mut self, v: Table) -> Self {
        self.table = v;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ListTablesRequest {
    pub parent: String,
    pub view: TableView,
    /// The maximum number of tables per page, zero means the service default.
    pub page_size: i32,
    /// The [next_page_token][ListTablesResponse::next_page_token] of the
    /// previous page, empty for the first page.
    pub page_token: String,
}

impl ListTablesRequest {
    pub fn set_parent<T: Into<String>>(mut self, v: T) -> Self {
        self.parent = v.into();
        self
    }

    pub fn set_view(mut self, v: TableView) -> Self {
        self.view = v;
        self
    }

    pub fn set_page_size(mut self, v: i32) -> Self {
        self.page_size = v;
        self
    }

    pub fn set_page_token<T: Into<String>>(mut self, v: T) -> Self {
        self.page_token = v.into();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ListTablesResponse {
    pub tables: Vec<Table>,
    /// Empty on the last page.
    pub next_page_token: String,
}

impl ListTablesResponse {
    pub fn set_tables<T: IntoIterator<Item = Table>>(mut self, v: T) -> Self {
        self.tables = v.into_iter().collect();
        self
    }

    pub fn set_next_page_token<T: Into<String>>(mut self, v: T) -> Self {
        self.next_page_token = v.into();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct GetTableRequest {
    pub name: String,
    pub view: TableView,
}

impl GetTableRequest {
    pub fn set_name<T: Into<String>>(mut self, v: T) -> Self {
        self.name = v.into();
        self
    }

    pub fn set_view(mut self, v: TableView) -> Self {
        self.view = v;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct DeleteTableRequest {
    pub name: String,
}

impl DeleteTableRequest {
    pub fn set_name<T: Into<String>>(mut self, v: T) -> Self {
        self.name = v.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table() {
        let table = Table::default()
            .set_name("projects/p/instances/i/tables/t")
            .set_column_families(["cf1", "cf2"]);
        assert_eq!(table.name, "projects/p/instances/i/tables/t");
        assert_eq!(table.column_families, vec!["cf1", "cf2"]);
    }

    #[test]
    fn list_tables() {
        let request = ListTablesRequest::default()
            .set_parent("projects/p/instances/i")
            .set_view(TableView::NameOnly)
            .set_page_size(10)
            .set_page_token("abc");
        assert_eq!(request.parent, "projects/p/instances/i");
        assert_eq!(request.view, TableView::NameOnly);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.page_token, "abc");

        let response = ListTablesResponse::default()
            .set_tables([Table::default().set_name("t1")])
            .set_next_page_token("def");
        assert_eq!(response.tables.len(), 1);
        assert_eq!(response.next_page_token, "def");
    }
}
