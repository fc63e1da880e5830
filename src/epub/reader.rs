use std::io::{Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::container::Container;
use crate::epub::error::{EpubError, Result};

/// EPUB要求的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 容器描述文件的固定路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// 压缩包层面的EPUB读取器
///
/// 只负责按名称读取条目，解析后的内容模型见 [`Archive`](crate::epub::Archive)。
pub struct Epub<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Epub<R> {
    /// 从任意可随机读取的数据源创建实例，并校验mimetype
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut epub = Epub { archive };
        epub.validate()?;
        Ok(epub)
    }

    /// 验证EPUB文件的合法性
    ///
    /// 缺少mimetype只记录警告（不少现实中的文件如此），内容错误则视为无效容器。
    fn validate(&mut self) -> Result<()> {
        let content = match self.read_bytes("mimetype")? {
            Some(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
            None => {
                tracing::warn!("EPUB缺少mimetype文件");
                return Ok(());
            }
        };

        if content != EPUB_MIMETYPE {
            return Err(EpubError::InvalidMimetype {
                expected: EPUB_MIMETYPE.to_string(),
                found: content,
            });
        }
        Ok(())
    }

    /// 按压缩包内的存储顺序列出文件条目
    pub fn entries_in_order(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let file = self.archive.by_index(index)?;
            if !file.is_dir() {
                names.push(file.name().to_string());
            }
        }
        Ok(names)
    }

    /// 提取指定文件的二进制内容，条目不存在时返回 `None`
    pub fn read_bytes(&mut self, filename: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(filename) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }

    /// 提取指定文件的文本内容
    pub fn read_string(&mut self, filename: &str) -> Result<Option<String>> {
        Ok(self
            .read_bytes(filename)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// 解析container.xml文件
    pub fn container(&mut self) -> Result<Container> {
        let content = self
            .read_string(CONTAINER_PATH)?
            .ok_or_else(|| EpubError::ContainerParseError(format!("缺少 {}", CONTAINER_PATH)))?;
        Container::parse_xml(&content)
    }

    /// 获取主要的OPF文件路径
    pub fn opf_path(&mut self) -> Result<String> {
        let container = self.container()?;
        container
            .opf_path()
            .map(str::to_string)
            .ok_or_else(|| EpubError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string()))
    }
}
