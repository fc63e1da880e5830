use crate::epub::error::{EpubError, Result};
use crate::epub::xml;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// OPF包文件的标准媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只收集 `<rootfiles>` 内部、同时带有 `full-path` 与 `media-type` 的条目。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();
        let mut in_rootfiles = false;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) if e.local_name().as_ref() == b"rootfiles" => {
                    in_rootfiles = true;
                }
                Event::Start(ref e) | Event::Empty(ref e)
                    if in_rootfiles && e.local_name().as_ref() == b"rootfile" =>
                {
                    let full_path = xml::attribute(e, "full-path")?.unwrap_or_default();
                    let media_type = xml::attribute(e, "media-type")?.unwrap_or_default();
                    if !full_path.is_empty() && !media_type.is_empty() {
                        rootfiles.push(RootFile { full_path, media_type });
                    }
                }
                Event::End(ref e) if e.local_name().as_ref() == b"rootfiles" => {
                    in_rootfiles = false;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError(
                "没有找到任何rootfile条目".to_string(),
            ));
        }

        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    ///
    /// 优先返回媒体类型为OPF的rootfile，否则退回到第一个条目。
    pub fn opf_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.as_str())
    }
}
