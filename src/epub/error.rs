use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// 错误类别，用于决定批处理中的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 容器损坏或不可读，跳过整本书
    ArchiveRead,
    /// 单个内容文档无法解析，跳过或保留原样
    UnparsableDocument,
    /// 标题或目录缺失，使用回退值
    MetadataMissing,
    /// 输出路径无法创建或写入
    IoWrite,
    /// 配置或模板错误
    Config,
}

/// Epub相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF文件解析错误: {0}")]
    OpfParseError(String),

    #[error("NCX文件解析错误: {0}")]
    NcxParseError(String),

    #[error("导航文档解析错误: {0}")]
    NavParseError(String),

    #[error("无法读取EPUB文件 {path}: {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: Box<EpubError>,
    },

    #[error("无法解析内容文档: {0}")]
    UnparsableDocument(String),

    #[error("缺少元数据: {0}")]
    MetadataMissing(String),

    #[error("无法写入 {path}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}

impl EpubError {
    /// 获取错误所属的类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            EpubError::Io(_)
            | EpubError::Zip(_)
            | EpubError::XmlError(_)
            | EpubError::InvalidMimetype { .. }
            | EpubError::ContainerParseError(_)
            | EpubError::OpfParseError(_)
            | EpubError::NcxParseError(_)
            | EpubError::NavParseError(_)
            | EpubError::ArchiveRead { .. } => ErrorKind::ArchiveRead,
            EpubError::UnparsableDocument(_) => ErrorKind::UnparsableDocument,
            EpubError::MetadataMissing(_) => ErrorKind::MetadataMissing,
            EpubError::IoWrite { .. } => ErrorKind::IoWrite,
            EpubError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// 包装为针对某个EPUB文件的读取错误
    pub fn archive_read(path: impl Into<PathBuf>, source: EpubError) -> Self {
        EpubError::ArchiveRead {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 包装为输出写入错误
    pub fn io_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EpubError::IoWrite {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = EpubError::archive_read("a.epub", EpubError::OpfParseError("x".to_string()));
        assert_eq!(err.kind(), ErrorKind::ArchiveRead);
        assert!(err.to_string().contains("a.epub"));

        let err = EpubError::io_write("out/index.html", io::Error::other("磁盘已满"));
        assert_eq!(err.kind(), ErrorKind::IoWrite);

        assert_eq!(
            EpubError::UnparsableDocument("ch1".to_string()).kind(),
            ErrorKind::UnparsableDocument
        );
        assert_eq!(
            EpubError::MetadataMissing("title".to_string()).kind(),
            ErrorKind::MetadataMissing
        );
    }
}
