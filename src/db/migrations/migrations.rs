// 数据库迁移脚本定义

use super::Migration;

/// 获取所有迁移
pub fn get_all_migrations() -> Vec<Migration> {
    vec![
        create_organizations_table(),
        create_users_table(),
        create_roles_and_permissions_tables(),
        create_organization_access_table(),
        create_file_storage_table(),
        create_knowledge_base_tables(),
        create_agents_table(),
    ]
}

fn create_organizations_table() -> Migration {
    Migration {
        version: "20250101_000001".to_string(),
        name: "create_organizations_table".to_string(),
        description: "创建组织表".to_string(),
        up_sql: r#"
            CREATE TABLE organizations (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(255) NOT NULL,
                code VARCHAR(50) NOT NULL UNIQUE,
                logo_url TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX idx_organizations_created_at ON organizations(created_at);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS organizations;
        "#
        .to_string(),
        dependencies: vec![],
    }
}

fn create_users_table() -> Migration {
    Migration {
        version: "20250101_000002".to_string(),
        name: "create_users_table".to_string(),
        description: "创建用户表".to_string(),
        up_sql: r#"
            CREATE TABLE users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255),
                password_hash VARCHAR(255),
                profile_picture_url TEXT,
                reset_token VARCHAR(255),
                reset_token_expiry TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX idx_users_reset_token ON users(reset_token);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS users;
        "#
        .to_string(),
        dependencies: vec![],
    }
}

fn create_roles_and_permissions_tables() -> Migration {
    Migration {
        version: "20250101_000003".to_string(),
        name: "create_roles_and_permissions_tables".to_string(),
        description: "创建角色、权限及关联表".to_string(),
        up_sql: r#"
            CREATE TABLE roles (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(255) NOT NULL,
                is_custom BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE permissions (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                resource VARCHAR(100) NOT NULL,
                can_create BOOLEAN NOT NULL DEFAULT FALSE,
                can_read BOOLEAN NOT NULL DEFAULT FALSE,
                can_update BOOLEAN NOT NULL DEFAULT FALSE,
                can_delete BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE role_permissions (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
                permission_id UUID NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
                UNIQUE (role_id, permission_id)
            );

            CREATE INDEX idx_permissions_resource ON permissions(resource);
            CREATE INDEX idx_role_permissions_role_id ON role_permissions(role_id);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS role_permissions;
            DROP TABLE IF EXISTS permissions;
            DROP TABLE IF EXISTS roles;
        "#
        .to_string(),
        dependencies: vec![],
    }
}

fn create_organization_access_table() -> Migration {
    Migration {
        version: "20250101_000004".to_string(),
        name: "create_organization_access_table".to_string(),
        description: "创建组织成员访问表".to_string(),
        up_sql: r#"
            CREATE TYPE legacy_role AS ENUM ('ADMIN', 'MANAGER', 'EDITOR', 'VIEWER', 'GUEST');

            CREATE TABLE organization_access (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                legacy_role legacy_role NOT NULL DEFAULT 'VIEWER',
                role_id UUID REFERENCES roles(id) ON DELETE SET NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, organization_id)
            );

            CREATE INDEX idx_organization_access_org ON organization_access(organization_id);
            CREATE INDEX idx_organization_access_role ON organization_access(role_id);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS organization_access;
            DROP TYPE IF EXISTS legacy_role;
        "#
        .to_string(),
        dependencies: vec![
            "20250101_000001".to_string(),
            "20250101_000002".to_string(),
            "20250101_000003".to_string(),
        ],
    }
}

fn create_file_storage_table() -> Migration {
    Migration {
        version: "20250101_000005".to_string(),
        name: "create_file_storage_table".to_string(),
        description: "创建文件存储元数据表".to_string(),
        up_sql: r#"
            CREATE TABLE file_storage (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                file_name VARCHAR(500) NOT NULL,
                file_path VARCHAR(1000) NOT NULL,
                file_type VARCHAR(100) NOT NULL,
                file_size BIGINT NOT NULL,
                mime_type VARCHAR(255),
                is_secure BOOLEAN NOT NULL DEFAULT FALSE,
                access_token VARCHAR(128),
                token_expiry TIMESTAMPTZ,
                organization_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
                user_id UUID REFERENCES users(id) ON DELETE SET NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX idx_file_storage_org ON file_storage(organization_id);
            CREATE INDEX idx_file_storage_user ON file_storage(user_id);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS file_storage;
        "#
        .to_string(),
        dependencies: vec!["20250101_000001".to_string(), "20250101_000002".to_string()],
    }
}

fn create_knowledge_base_tables() -> Migration {
    Migration {
        version: "20250101_000006".to_string(),
        name: "create_knowledge_base_tables".to_string(),
        description: "创建知识库及训练记录表".to_string(),
        up_sql: r#"
            CREATE TYPE knowledge_base_status AS ENUM ('PENDING', 'CREATING', 'READY', 'ERROR');
            CREATE TYPE training_status AS ENUM ('PROCESSING', 'COMPLETED', 'FAILED');

            CREATE TABLE knowledge_bases (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                organization_id UUID NOT NULL UNIQUE REFERENCES organizations(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                vector_store_id VARCHAR(255),
                status knowledge_base_status NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE training_files (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                knowledge_base_id UUID NOT NULL REFERENCES knowledge_bases(id) ON DELETE CASCADE,
                file_storage_id UUID NOT NULL REFERENCES file_storage(id) ON DELETE CASCADE,
                status training_status NOT NULL DEFAULT 'PROCESSING',
                error_message TEXT,
                processed_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (knowledge_base_id, file_storage_id)
            );

            CREATE TABLE training_websites (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                knowledge_base_id UUID NOT NULL REFERENCES knowledge_bases(id) ON DELETE CASCADE,
                url TEXT NOT NULL,
                status training_status NOT NULL DEFAULT 'PROCESSING',
                error_message TEXT,
                processed_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (knowledge_base_id, url)
            );

            CREATE INDEX idx_training_files_kb ON training_files(knowledge_base_id);
            CREATE INDEX idx_training_websites_kb ON training_websites(knowledge_base_id);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS training_websites;
            DROP TABLE IF EXISTS training_files;
            DROP TABLE IF EXISTS knowledge_bases;
            DROP TYPE IF EXISTS training_status;
            DROP TYPE IF EXISTS knowledge_base_status;
        "#
        .to_string(),
        dependencies: vec!["20250101_000001".to_string(), "20250101_000005".to_string()],
    }
}

fn create_agents_table() -> Migration {
    Migration {
        version: "20250101_000007".to_string(),
        name: "create_agents_table".to_string(),
        description: "创建 AI Agent 表".to_string(),
        up_sql: r#"
            CREATE TABLE agents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                system_prompt TEXT,
                model VARCHAR(100) NOT NULL DEFAULT 'gpt-4',
                temperature DOUBLE PRECISION NOT NULL DEFAULT 0.7,
                max_tokens INTEGER,
                knowledge_base_id UUID REFERENCES knowledge_bases(id) ON DELETE SET NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX idx_agents_org_created ON agents(organization_id, created_at DESC);
        "#
        .to_string(),
        down_sql: r#"
            DROP TABLE IF EXISTS agents;
        "#
        .to_string(),
        dependencies: vec!["20250101_000006".to_string()],
    }
}
