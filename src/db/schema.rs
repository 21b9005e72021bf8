//! Schema DDL for the installation database.

/// Table layout for installed packages, their dependency edges, owned
/// files, and configured repositories. Applied with `IF NOT EXISTS` so it
/// is safe to run against an existing database on every open.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS packages (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT NOT NULL UNIQUE,
    version           TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT '',
    architecture      TEXT NOT NULL,
    maintainer        TEXT NOT NULL DEFAULT '',
    homepage          TEXT NOT NULL DEFAULT '',
    license           TEXT NOT NULL DEFAULT '',
    size              INTEGER NOT NULL,
    checksum          TEXT NOT NULL,
    install_timestamp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dependencies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    package_id  INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    dep_name    TEXT NOT NULL,
    dep_version TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_dependencies_package_id ON dependencies(package_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_dep_name ON dependencies(dep_name);

CREATE TABLE IF NOT EXISTS files (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    path       TEXT NOT NULL,
    ordinal    INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_package_id ON files(package_id);

CREATE TABLE IF NOT EXISTS repositories (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL UNIQUE,
    url      TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    enabled  INTEGER NOT NULL DEFAULT 1
);
";
